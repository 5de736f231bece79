//! Text width measurement with a per-document cache.

use std::collections::HashMap;

use log::{debug, warn};

/// Underlying width source, typically a font rasterizer owned by the
/// rendering side. Returns `None` when it cannot measure right now.
pub trait GlyphMetrics {
    fn text_width(&self, font_family: &str, text: &str, bold: bool) -> Option<f32>;
}

/// Fixed-advance metrics, the same model a bitmap font uses: every glyph
/// takes one advance, bold glyphs are widened by a constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub bold_extra: f32,
}

impl MonospaceMetrics {
    pub const fn new(advance: f32, bold_extra: f32) -> Self {
        Self {
            advance,
            bold_extra,
        }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self::new(12.0, 1.0)
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn text_width(&self, _font_family: &str, text: &str, bold: bool) -> Option<f32> {
        let glyphs = text.chars().count() as f32;
        let per_glyph = if bold {
            self.advance + self.bold_extra
        } else {
            self.advance
        };
        Some(glyphs * per_glyph)
    }
}

/// Memoizing front for a [`GlyphMetrics`] backend.
///
/// Never fails: when the backend has no answer the width is estimated from
/// the glyph count.
pub struct Measurer {
    metrics: Box<dyn GlyphMetrics>,
    font_family: String,
    fallback_char_width: f32,
    regular: HashMap<String, f32>,
    bold: HashMap<String, f32>,
    fallback_reported: bool,
}

impl Measurer {
    /// Share of the font size used as the per-glyph fallback width.
    pub const FALLBACK_EM_RATIO: f32 = 0.6;

    pub fn new(metrics: Box<dyn GlyphMetrics>, font_family: &str, font_size: f32) -> Self {
        Self {
            metrics,
            font_family: font_family.to_owned(),
            fallback_char_width: font_size.max(1.0) * Self::FALLBACK_EM_RATIO,
            regular: HashMap::new(),
            bold: HashMap::new(),
            fallback_reported: false,
        }
    }

    pub fn measure(&mut self, text: &str, bold: bool) -> f32 {
        let cache = if bold { &self.bold } else { &self.regular };
        if let Some(width) = cache.get(text) {
            return *width;
        }

        let width = match self.metrics.text_width(&self.font_family, text, bold) {
            Some(width) if width.is_finite() && width >= 0.0 => width,
            _ => {
                if !self.fallback_reported {
                    warn!(
                        "measure: backend unavailable for font={:?}, estimating {}px per glyph",
                        self.font_family, self.fallback_char_width
                    );
                    self.fallback_reported = true;
                }
                self.estimate(text)
            }
        };

        let cache = if bold { &mut self.bold } else { &mut self.regular };
        cache.insert(text.to_owned(), width);
        width
    }

    /// Drops every cached width. Called whenever a new document is loaded.
    pub fn clear(&mut self) {
        debug!(
            "measure: clear cache regular={} bold={}",
            self.regular.len(),
            self.bold.len()
        );
        self.regular.clear();
        self.bold.clear();
        self.fallback_reported = false;
    }

    pub fn cached_entries(&self) -> usize {
        self.regular.len() + self.bold.len()
    }

    fn estimate(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.fallback_char_width
    }
}
