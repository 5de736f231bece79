//! Packs the positional index into screen lines around the focus word.
//!
//! The focus line keeps each word at its layout offset shifted so the anchor
//! lands on the viewport center. Everything before the focus line is packed
//! backwards into right-aligned lines above it; everything after it into
//! left-aligned lines below. Only as many lines as configured are computed.

use log::trace;
use serde::Serialize;

use crate::{config::ReaderConfig, layout::WordPosition};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedWord {
    pub index: u32,
    pub x: f32,
    pub width: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComposedLine {
    /// Vertical offset from the focus line. Negative above.
    pub y: f32,
    pub words: Vec<PlacedWord>,
}

impl ComposedLine {
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().map(|word| word.index)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedLines {
    /// Added to a layout offset to get its screen x on the focus line.
    pub global_offset: f32,
    pub focus_line: ComposedLine,
    /// Top to bottom, so the line nearest the focus line comes last.
    pub past_lines: Vec<ComposedLine>,
    /// Top to bottom, nearest first.
    pub future_lines: Vec<ComposedLine>,
}

impl ComposedLines {
    pub fn is_empty(&self) -> bool {
        self.focus_line.words.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineComposer {
    viewport_width: f32,
    lines_above: u16,
    lines_below: u16,
    spacing: f32,
    row_height: f32,
}

impl LineComposer {
    pub fn new(
        viewport_width: f32,
        lines_above: u16,
        lines_below: u16,
        spacing: f32,
        row_height: f32,
    ) -> Self {
        Self {
            viewport_width,
            lines_above,
            lines_below,
            spacing: spacing.max(0.0),
            row_height,
        }
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(
            config.viewport_width,
            config.lines_above,
            config.lines_below,
            config.word_spacing,
            config.row_height,
        )
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        self.viewport_width = viewport_width;
    }

    /// Composes with the focus word's center on the viewport center.
    pub fn compose(&self, positions: &[WordPosition], focus_index: usize) -> ComposedLines {
        let last = positions.len().saturating_sub(1);
        let anchor = positions
            .get(focus_index.min(last))
            .map_or(0.0, |position| position.center_position);
        self.compose_at(positions, focus_index, anchor)
    }

    /// Composes with an arbitrary layout offset on the viewport center, as
    /// continuous scrolling needs.
    pub fn compose_at(
        &self,
        positions: &[WordPosition],
        focus_index: usize,
        anchor: f32,
    ) -> ComposedLines {
        let viewport = self.viewport_width;
        if positions.is_empty() || !(viewport.is_finite() && viewport > 0.0) {
            trace!("compose: empty layout viewport={}", viewport);
            return ComposedLines::default();
        }

        let focus = focus_index.min(positions.len() - 1);
        let global_offset = viewport / 2.0 - anchor;

        let mut first = focus;
        while first > 0 && global_offset + positions[first - 1].end_offset() >= 0.0 {
            first -= 1;
        }
        let mut last = focus;
        while last + 1 < positions.len()
            && global_offset + positions[last + 1].start_offset <= viewport
        {
            last += 1;
        }

        let focus_line = ComposedLine {
            y: 0.0,
            words: positions[first..=last]
                .iter()
                .map(|position| PlacedWord {
                    index: position.index,
                    x: global_offset + position.start_offset,
                    width: position.rendered_width,
                })
                .collect(),
        };

        let mut past_lines: Vec<ComposedLine> = self
            .fill(positions[..first].iter().rev(), self.lines_above as usize)
            .into_iter()
            .enumerate()
            .map(|(row, mut words)| {
                words.reverse();
                self.place_right_aligned(&words, -((row + 1) as f32) * self.row_height)
            })
            .collect();
        past_lines.reverse();

        let future_lines: Vec<ComposedLine> = self
            .fill(positions[last + 1..].iter(), self.lines_below as usize)
            .into_iter()
            .enumerate()
            .map(|(row, words)| self.place_left_aligned(&words, (row + 1) as f32 * self.row_height))
            .collect();

        trace!(
            "compose: focus={} line={}..={} past={} future={}",
            focus,
            first,
            last,
            past_lines.len(),
            future_lines.len()
        );

        ComposedLines {
            global_offset,
            focus_line,
            past_lines,
            future_lines,
        }
    }

    /// Greedy fill in iteration order. A word that does not fit closes the
    /// current line; a word wider than a whole line gets a line to itself.
    fn fill<'p>(
        &self,
        words: impl Iterator<Item = &'p WordPosition>,
        max_lines: usize,
    ) -> Vec<Vec<&'p WordPosition>> {
        let mut lines: Vec<Vec<&WordPosition>> = Vec::new();
        if max_lines == 0 {
            return lines;
        }

        let limit = (self.viewport_width - self.spacing).max(0.0);
        let mut current: Vec<&WordPosition> = Vec::new();
        let mut width = 0.0f32;

        for word in words {
            let needed = if current.is_empty() {
                word.rendered_width
            } else {
                width + self.spacing + word.rendered_width
            };

            if !current.is_empty() && needed > limit {
                lines.push(core::mem::take(&mut current));
                if lines.len() == max_lines {
                    return lines;
                }
                width = word.rendered_width;
            } else {
                width = needed;
            }
            current.push(word);
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn place_left_aligned(&self, words: &[&WordPosition], y: f32) -> ComposedLine {
        let mut x = 0.0f32;
        let words = words
            .iter()
            .map(|position| {
                let placed = PlacedWord {
                    index: position.index,
                    x,
                    width: position.rendered_width,
                };
                x += position.rendered_width + self.spacing;
                placed
            })
            .collect();
        ComposedLine { y, words }
    }

    /// Ends the line flush with the right edge. A lone overwide word starts
    /// left of zero and is the only case that does.
    fn place_right_aligned(&self, words: &[&WordPosition], y: f32) -> ComposedLine {
        let line_width = words
            .iter()
            .map(|position| position.rendered_width)
            .sum::<f32>()
            + self.spacing * words.len().saturating_sub(1) as f32;
        let mut line = self.place_left_aligned(words, y);
        let shift = self.viewport_width - line_width;
        for word in &mut line.words {
            word.x += shift;
        }
        line
    }
}
