//! Playback clock: the state machine that advances through a document.
//!
//! The clock owns the [`PlaybackState`] and the handles of whatever it has
//! scheduled, nothing else. The document and the scheduler are passed in by
//! the caller on every operation. At most one advance handle is live at a
//! time; every path that installs a schedule cancels the previous handle
//! first, and a firing is acted on only if it matches the handle held.

mod navigation;
mod runtime;
#[cfg(test)]
mod tests;

use crate::{
    config::ReaderConfig,
    document::Document,
    events::ReaderEvent,
    schedule::TimerHandle,
    state::{Mode, PlaybackState},
};

pub use navigation::{PageDirection, ScrollInput};

/// Whether a timer firing changed anything worth repainting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Pacing {
    min_wpm: u16,
    max_wpm: u16,
    wpm_step: u16,
    words_per_page: u32,
    sentences_per_page: u32,
    auto_resume_ms: Option<u32>,
    toggle_target: Mode,
}

impl Pacing {
    fn from_config(config: &ReaderConfig) -> Self {
        Self {
            min_wpm: config.min_wpm.max(1),
            max_wpm: config.max_wpm.max(1),
            wpm_step: config.wpm_step.max(1),
            words_per_page: config.paging_words_per_page.max(1),
            sentences_per_page: config.paging_sentences_per_page.max(1),
            auto_resume_ms: config.auto_resume_ms,
            toggle_target: config.toggle_target,
        }
    }

    fn clamp_wpm(&self, wpm: u16) -> u16 {
        wpm.clamp(self.min_wpm, self.max_wpm.max(self.min_wpm))
    }
}

#[derive(Debug)]
pub struct PlaybackClock {
    state: PlaybackState,
    pacing: Pacing,
    advance: Option<TimerHandle>,
    resume: Option<TimerHandle>,
    /// Playback was running when the current manual interruption began.
    resume_armed: bool,
    last_frame_ms: Option<u64>,
    /// Running continuous-mode position. `state.scroll_offset` is a copy
    /// narrowed to `f32`, which loses sub-pixel steps far into a document.
    scroll_px: f64,
    pixels_per_ms: f64,
    events: Vec<ReaderEvent>,
}

impl PlaybackClock {
    pub fn new(config: &ReaderConfig, document: &Document) -> Self {
        let pacing = Pacing::from_config(config);
        let wpm = pacing.clamp_wpm(config.wpm);
        let mut clock = Self {
            state: PlaybackState::fresh(Mode::Word, wpm),
            pacing,
            advance: None,
            resume: None,
            resume_armed: false,
            last_frame_ms: None,
            scroll_px: 0.0,
            pixels_per_ms: 0.0,
            events: Vec::new(),
        };
        clock.set_scroll(document.layout().center_of(0) as f64);
        clock.recalibrate(document);
        clock
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn focus_index(&self) -> usize {
        self.state.focus_index as usize
    }

    pub fn sentence_index(&self) -> usize {
        self.state.sentence_index as usize
    }

    pub fn wpm(&self) -> u16 {
        self.state.wpm
    }

    /// Continuous-mode speed. The average word, not any particular one,
    /// takes `60000 / wpm` milliseconds to pass the focus point.
    pub fn pixels_per_ms(&self) -> f64 {
        self.pixels_per_ms
    }

    /// Full-precision scroll offset in pixels.
    pub fn scroll_position(&self) -> f64 {
        self.scroll_px
    }

    pub fn active_advance(&self) -> Option<TimerHandle> {
        self.advance
    }

    pub fn pending_resume(&self) -> Option<TimerHandle> {
        self.resume
    }

    /// 1-based page number and page count for the current mode.
    pub fn page(&self, document: &Document) -> (u32, u32) {
        match self.state.mode {
            Mode::Sentence => {
                let per_page = self.pacing.sentences_per_page;
                let total = (document.sentence_count() as u32).div_ceil(per_page).max(1);
                (self.state.sentence_index / per_page + 1, total)
            }
            Mode::Word | Mode::Continuous => {
                let per_page = self.pacing.words_per_page;
                let total = (document.word_count() as u32).div_ceil(per_page).max(1);
                (self.state.focus_index / per_page + 1, total)
            }
        }
    }

    /// `(words read including the focus word, word count)`.
    pub fn progress(&self, document: &Document) -> (u32, u32) {
        (self.state.focus_index + 1, document.word_count() as u32)
    }

    pub fn drain_events(&mut self) -> Vec<ReaderEvent> {
        core::mem::take(&mut self.events)
    }

    fn word_interval_ms(&self) -> u32 {
        (60_000u32 / self.state.wpm.max(1) as u32).max(1)
    }

    fn sentence_delay_ms(&self, document: &Document) -> u32 {
        let words = document
            .sentence(self.sentence_index())
            .map_or(1, |span| span.word_count()) as u64;
        ((words * 60_000) / self.state.wpm.max(1) as u64).clamp(1, u32::MAX as u64) as u32
    }

    fn recalibrate(&mut self, document: &Document) {
        let words = document.word_count().max(1) as f64;
        let average_width = document.layout().total_width() as f64 / words;
        let ms_per_word = 60_000.0 / self.state.wpm.max(1) as f64;
        self.pixels_per_ms = average_width / ms_per_word;
    }

    /// Moves focus to `index` (clamped) and keeps the sentence and scroll
    /// fields in step with it.
    fn place_focus(&mut self, document: &Document, index: usize) {
        let index = index.min(document.last_index());
        let previous = (self.state.focus_index, self.state.sentence_index);

        self.state.focus_index = index as u32;
        self.state.sentence_index = document.sentences().sentence_for_word(index as u32) as u32;
        self.set_scroll(document.layout().center_of(index) as f64);

        if previous != (self.state.focus_index, self.state.sentence_index) {
            self.push_position();
        }
    }

    /// Moves to the start of sentence `sentence_index` (clamped).
    fn place_sentence(&mut self, document: &Document, sentence_index: usize) {
        let last = document.sentence_count().saturating_sub(1);
        let start = document
            .sentence(sentence_index.min(last))
            .map_or(0, |span| span.start_word_index as usize);
        self.place_focus(document, start);
    }

    /// Sets the continuous-mode offset (clamped) and derives the focus word.
    fn place_scroll(&mut self, document: &Document, offset: f64) {
        let last_center = document.layout().last_center() as f64;
        let offset = if offset.is_finite() {
            offset.clamp(0.0, last_center)
        } else {
            document.layout().center_of(self.focus_index()) as f64
        };

        let nearest = document.layout().nearest_index(offset as f32);
        let previous = (self.state.focus_index, self.state.sentence_index);
        self.set_scroll(offset);
        self.state.focus_index = nearest as u32;
        self.state.sentence_index = document.sentences().sentence_for_word(nearest as u32) as u32;

        if previous != (self.state.focus_index, self.state.sentence_index) {
            self.push_position();
        }
    }

    fn set_scroll(&mut self, offset: f64) {
        self.scroll_px = offset;
        self.state.scroll_offset = offset as f32;
    }

    fn push_position(&mut self) {
        self.events.push(ReaderEvent::PositionChanged {
            focus_index: self.state.focus_index,
            sentence_index: self.state.sentence_index,
        });
    }

    fn push_page(&mut self, document: &Document, before: (u32, u32)) {
        let (page, total) = self.page(document);
        if (page, total) != before {
            self.events.push(ReaderEvent::PageChanged { page, total });
        }
    }
}
