//! Positional index of a document laid out on one infinite line.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{error::ReaderError, measure::Measurer};

/// Lower bound on a word's rendered width. Keeps center positions strictly
/// increasing even when the backend reports zero-width glyphs.
pub const MIN_WORD_WIDTH: f32 = 1.0;

/// Index of the fixation character for a word of `len` characters.
pub const fn center_index(len: usize) -> usize {
    if len <= 2 { 0 } else { len / 2 }
}

/// A word cut around its fixation character.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct FocusSplit<'a> {
    pub before: &'a str,
    pub center: &'a str,
    pub after: &'a str,
}

pub fn split_focus(word: &str) -> FocusSplit<'_> {
    let len = word.chars().count();
    let center = center_index(len);

    let mut bounds = word.char_indices().map(|(offset, _)| offset).skip(center);
    let start = bounds.next().unwrap_or(word.len());
    let end = bounds.next().unwrap_or(word.len());

    FocusSplit {
        before: &word[..start],
        center: &word[start..end],
        after: &word[end..],
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPosition {
    pub index: u32,
    pub start_offset: f32,
    /// Width in focus style, used for every word whether focused or not.
    pub rendered_width: f32,
    pub center_offset: f32,
    pub center_position: f32,
}

impl WordPosition {
    pub fn end_offset(&self) -> f32 {
        self.start_offset + self.rendered_width
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    positions: Vec<WordPosition>,
    spacing: f32,
    total_width: f32,
}

impl Layout {
    /// Single forward pass over `words`, accumulating focus-style widths
    /// plus `spacing` into a running offset.
    pub fn build<S: AsRef<str>>(
        words: &[S],
        measurer: &mut Measurer,
        spacing: f32,
    ) -> Result<Self, ReaderError> {
        if words.is_empty() {
            return Err(ReaderError::EmptyDocument);
        }

        let spacing = spacing.max(0.0);
        let mut positions = Vec::with_capacity(words.len());
        let mut offset = 0.0f32;

        for (index, word) in words.iter().enumerate() {
            let word = word.as_ref();
            if word.is_empty() {
                return Err(ReaderError::EmptyWord { index });
            }

            let split = split_focus(word);
            let width = (measurer.measure(split.before, false)
                + measurer.measure(split.center, true)
                + measurer.measure(split.after, false))
            .max(MIN_WORD_WIDTH);

            let mut center_offset = measurer.measure(split.center, true) / 2.0;
            let mut utf8 = [0u8; 4];
            for ch in split.before.chars() {
                center_offset += measurer.measure(ch.encode_utf8(&mut utf8), false);
            }
            let center_offset = center_offset.clamp(0.0, width - MIN_WORD_WIDTH / 2.0);

            positions.push(WordPosition {
                index: index as u32,
                start_offset: offset,
                rendered_width: width,
                center_offset,
                center_position: offset + center_offset,
            });

            offset += width + spacing;
        }

        debug!(
            "layout: built words={} total_width={} cached_widths={}",
            positions.len(),
            offset,
            measurer.cached_entries()
        );

        Ok(Self {
            positions,
            spacing,
            total_width: offset,
        })
    }

    pub fn positions(&self) -> &[WordPosition] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordPosition> {
        self.positions.get(index)
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Sum of every word's width and trailing spacing.
    pub fn total_width(&self) -> f32 {
        self.total_width
    }

    pub fn last_center(&self) -> f32 {
        self.positions
            .last()
            .map_or(0.0, |position| position.center_position)
    }

    pub fn center_of(&self, index: usize) -> f32 {
        let last = self.positions.len().saturating_sub(1);
        self.positions
            .get(index.min(last))
            .map_or(0.0, |position| position.center_position)
    }

    /// Word whose center is closest to `offset`. Ties go to the earlier word.
    pub fn nearest_index(&self, offset: f32) -> usize {
        if self.positions.is_empty() {
            return 0;
        }

        let after = self
            .positions
            .partition_point(|position| position.center_position < offset);
        if after == 0 {
            return 0;
        }
        if after >= self.positions.len() {
            return self.positions.len() - 1;
        }

        let before_distance = offset - self.positions[after - 1].center_position;
        let after_distance = self.positions[after].center_position - offset;
        if after_distance < before_distance {
            after
        } else {
            after - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::measure::MonospaceMetrics;

    fn measurer() -> Measurer {
        Measurer::new(Box::new(MonospaceMetrics::new(10.0, 2.0)), "mono", 20.0)
    }

    #[test]
    fn center_index_follows_length() {
        assert_eq!(center_index(1), 0);
        assert_eq!(center_index(2), 0);
        assert_eq!(center_index(3), 1);
        assert_eq!(center_index(4), 2);
        assert_eq!(center_index(7), 3);
    }

    #[test]
    fn split_focus_cuts_around_center() {
        assert_eq!(
            split_focus("cat"),
            FocusSplit {
                before: "c",
                center: "a",
                after: "t"
            }
        );
        assert_eq!(
            split_focus("it"),
            FocusSplit {
                before: "",
                center: "i",
                after: "t"
            }
        );
        assert_eq!(
            split_focus("señor"),
            FocusSplit {
                before: "se",
                center: "ñ",
                after: "or"
            }
        );
    }

    #[test]
    fn positions_accumulate_focus_widths() {
        let mut measurer = measurer();
        let layout = Layout::build(&["cat", "it"], &mut measurer, 5.0).unwrap();
        let positions = layout.positions();

        // "cat": 10 + 12 + 10, center = 10 + 12 / 2
        assert_eq!(positions[0].start_offset, 0.0);
        assert_eq!(positions[0].rendered_width, 32.0);
        assert_eq!(positions[0].center_offset, 16.0);

        // "it": 0 + 12 + 10, center = 12 / 2
        assert_eq!(positions[1].start_offset, 37.0);
        assert_eq!(positions[1].rendered_width, 22.0);
        assert_eq!(positions[1].center_position, 43.0);
        assert_eq!(layout.total_width(), 64.0);
    }

    #[test]
    fn center_positions_strictly_increase() {
        let words = ["a", "tiny", "x", "extraordinarily", "b", "of", "c"];
        let mut measurer = measurer();
        let layout = Layout::build(&words, &mut measurer, 0.0).unwrap();

        for pair in layout.positions().windows(2) {
            assert!(pair[0].center_position < pair[1].center_position);
            assert!(pair[0].start_offset <= pair[1].start_offset);
        }
    }

    #[test]
    fn empty_documents_are_rejected() {
        let mut measurer = measurer();
        let words: [&str; 0] = [];
        assert_eq!(
            Layout::build(&words, &mut measurer, 4.0),
            Err(ReaderError::EmptyDocument)
        );
        assert_eq!(
            Layout::build(&["ok", ""], &mut measurer, 4.0),
            Err(ReaderError::EmptyWord { index: 1 })
        );
    }

    #[test]
    fn nearest_index_picks_closest_center() {
        let mut measurer = measurer();
        let layout = Layout::build(&["aaa", "bbb", "ccc"], &mut measurer, 8.0).unwrap();
        let centers: Vec<f32> = layout
            .positions()
            .iter()
            .map(|position| position.center_position)
            .collect();

        assert_eq!(layout.nearest_index(-50.0), 0);
        assert_eq!(layout.nearest_index(centers[1] - 1.0), 1);
        assert_eq!(layout.nearest_index(centers[2] + 500.0), 2);
        let midpoint = (centers[0] + centers[1]) / 2.0;
        assert_eq!(layout.nearest_index(midpoint), 0);
    }
}
