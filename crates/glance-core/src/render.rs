//! View models consumed by whatever paints the reading screen.

use serde::Serialize;

use crate::{
    clock::PlaybackClock,
    compose::{ComposedLines, LineComposer, PlacedWord},
    document::Document,
    layout::split_focus,
    state::Mode,
};

/// The focus word cut at its fixation character, in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusWord<'a> {
    pub index: u32,
    pub before: &'a str,
    /// Drawn bold.
    pub center: &'a str,
    pub after: &'a str,
    pub x: f32,
    pub center_x: f32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLine {
    pub mode_label: &'static str,
    pub playing: bool,
    pub page: u32,
    pub total_pages: u32,
    pub wpm: u16,
}

/// Everything needed to paint one frame of the reader.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingView<'a> {
    pub title: &'a str,
    pub mode: Mode,
    /// `None` when the viewport has no room to show anything.
    pub focus: Option<FocusWord<'a>>,
    pub lines: ComposedLines,
    /// Whole text of the current sentence, sentence mode only.
    pub sentence: Option<&'a str>,
    pub status: StatusLine,
    #[serde(skip)]
    words: &'a [String],
}

impl<'a> ReadingView<'a> {
    pub fn build(document: &'a Document, clock: &PlaybackClock, composer: &LineComposer) -> Self {
        let state = clock.state();
        let focus_index = clock.focus_index();
        let lines = match state.mode {
            Mode::Continuous => {
                composer.compose_at(document.positions(), focus_index, state.scroll_offset)
            }
            Mode::Word | Mode::Sentence => composer.compose(document.positions(), focus_index),
        };

        let focus = if lines.is_empty() {
            None
        } else {
            document
                .layout()
                .get(focus_index)
                .zip(document.word(focus_index))
                .map(|(position, word)| {
                    let split = split_focus(word);
                    FocusWord {
                        index: position.index,
                        before: split.before,
                        center: split.center,
                        after: split.after,
                        x: lines.global_offset + position.start_offset,
                        center_x: lines.global_offset + position.center_position,
                    }
                })
        };

        let sentence = match state.mode {
            Mode::Sentence => document
                .sentence(clock.sentence_index())
                .map(|span| span.text.as_str()),
            Mode::Word | Mode::Continuous => None,
        };

        Self {
            title: &document.identity().title,
            mode: state.mode,
            focus,
            lines,
            sentence,
            status: status_line(document, clock),
            words: document.words(),
        }
    }

    /// Text of a word placed on any composed line.
    pub fn text_of(&self, placed: &PlacedWord) -> &'a str {
        self.words
            .get(placed.index as usize)
            .map_or("", String::as_str)
    }
}

pub fn status_line(document: &Document, clock: &PlaybackClock) -> StatusLine {
    let (page, total_pages) = clock.page(document);
    StatusLine {
        mode_label: clock.mode().label(),
        playing: clock.is_playing(),
        page,
        total_pages,
        wpm: clock.wpm(),
    }
}
