//! Engine configuration.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{error::ReaderError, state::Mode};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    pub wpm: u16,
    pub min_wpm: u16,
    pub max_wpm: u16,
    pub wpm_step: u16,
    /// Horizontal gap between words, in pixels.
    pub word_spacing: f32,
    pub lines_above: u16,
    pub lines_below: u16,
    pub row_height: f32,
    pub font_family: String,
    /// Only used by the fallback width estimate.
    pub font_size: f32,
    pub viewport_width: f32,
    pub paging_words_per_page: u32,
    pub paging_sentences_per_page: u32,
    /// Idle delay before playback resumes after a manual scroll. `None`
    /// leaves playback stopped.
    pub auto_resume_ms: Option<u32>,
    /// Mode that [`toggle_mode`](crate::session::ReaderSession::toggle_mode)
    /// flips to from word mode.
    pub toggle_target: Mode,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            wpm: 300,
            min_wpm: 50,
            max_wpm: 1000,
            wpm_step: 10,
            word_spacing: 12.0,
            lines_above: 2,
            lines_below: 3,
            row_height: 40.0,
            font_family: String::from("serif"),
            font_size: 24.0,
            viewport_width: 800.0,
            paging_words_per_page: 300,
            paging_sentences_per_page: 10,
            auto_resume_ms: Some(1_500),
            toggle_target: Mode::Sentence,
        }
    }
}

impl ReaderConfig {
    /// Rejects values the engine cannot run with and clamps the initial
    /// speed into the configured range.
    pub fn validate(mut self) -> Result<Self, ReaderError> {
        if self.wpm == 0 {
            return Err(invalid("wpm", "must be greater than zero"));
        }
        if self.min_wpm == 0 {
            return Err(invalid("minWpm", "must be greater than zero"));
        }
        if self.min_wpm > self.max_wpm {
            return Err(invalid("minWpm", "must not exceed maxWpm"));
        }
        if self.paging_words_per_page == 0 {
            return Err(invalid("pagingWordsPerPage", "must be greater than zero"));
        }
        if self.paging_sentences_per_page == 0 {
            return Err(invalid(
                "pagingSentencesPerPage",
                "must be greater than zero",
            ));
        }
        if !is_non_negative(self.word_spacing) {
            return Err(invalid("wordSpacing", "must be a non-negative number"));
        }
        if !is_non_negative(self.row_height) {
            return Err(invalid("rowHeight", "must be a non-negative number"));
        }
        if !is_non_negative(self.viewport_width) {
            return Err(invalid("viewportWidth", "must be a non-negative number"));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(invalid("fontSize", "must be a positive number"));
        }
        if self.font_family.trim().is_empty() {
            return Err(invalid("fontFamily", "is required"));
        }
        if self.toggle_target == Mode::Word {
            return Err(invalid("toggleTarget", "must differ from word mode"));
        }

        let clamped = self.wpm.clamp(self.min_wpm, self.max_wpm);
        if clamped != self.wpm {
            warn!(
                "config: wpm={} outside {}..={}, clamped to {}",
                self.wpm, self.min_wpm, self.max_wpm, clamped
            );
            self.wpm = clamped;
        }

        Ok(self)
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ReaderError {
    ReaderError::InvalidConfig { field, reason }
}

fn is_non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
