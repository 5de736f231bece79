use log::debug;

use super::PlaybackClock;
use crate::{
    document::Document,
    events::ReaderEvent,
    schedule::Scheduler,
    state::{Mode, PlaybackState},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageDirection {
    Previous,
    Next,
}

/// Manual scroll input, unbounded by nature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollInput {
    /// Drag distance along the text axis. Positive moves forward.
    Pixels(f32),
    /// Wheel notches or arrow presses, counted in words (sentences in
    /// sentence mode).
    Steps(i32),
}

impl PlaybackClock {
    /// Changes speed without moving the position. A running word-mode tick
    /// is replaced with one at the new interval; continuous mode picks the
    /// new rate up on its next frame; sentence mode on the next sentence.
    pub fn set_speed<S: Scheduler + ?Sized>(
        &mut self,
        wpm: u16,
        document: &Document,
        scheduler: &mut S,
    ) {
        let wpm = self.pacing.clamp_wpm(wpm);
        if wpm == self.state.wpm {
            return;
        }

        debug!("clock: speed {} -> {} wpm", self.state.wpm, wpm);
        self.state.wpm = wpm;
        self.recalibrate(document);
        if self.state.is_playing && self.state.mode == Mode::Word {
            self.install_schedule(document, scheduler);
        }
        self.events.push(ReaderEvent::SpeedChanged { wpm });
    }

    pub fn adjust_speed<S: Scheduler + ?Sized>(
        &mut self,
        increase: bool,
        document: &Document,
        scheduler: &mut S,
    ) {
        let step = self.pacing.wpm_step;
        let next = if increase {
            self.state.wpm.saturating_add(step)
        } else {
            self.state.wpm.saturating_sub(step)
        };
        self.set_speed(next, document, scheduler);
    }

    /// Jumps one page in either direction. Word and continuous modes page by
    /// a fixed word count, sentence mode by a fixed sentence count. Play
    /// state is kept; a running schedule restarts from the new position.
    pub fn seek_page<S: Scheduler + ?Sized>(
        &mut self,
        direction: PageDirection,
        document: &Document,
        scheduler: &mut S,
    ) {
        let page_before = self.page(document);

        match self.state.mode {
            Mode::Sentence => {
                let per_page = self.pacing.sentences_per_page as usize;
                let current = self.sentence_index();
                let target = match direction {
                    PageDirection::Next => current.saturating_add(per_page),
                    PageDirection::Previous => current.saturating_sub(per_page),
                };
                self.place_sentence(document, target);
            }
            Mode::Word | Mode::Continuous => {
                let per_page = self.pacing.words_per_page as usize;
                let page = self.focus_index() / per_page;
                let target = match direction {
                    PageDirection::Next => page.saturating_add(1).saturating_mul(per_page),
                    PageDirection::Previous => page.saturating_sub(1) * per_page,
                };
                self.place_focus(document, target);
            }
        }

        debug!(
            "clock: seek page {:?} mode={:?} focus={} sentence={}",
            direction, self.state.mode, self.state.focus_index, self.state.sentence_index
        );
        self.after_seek(document, scheduler, page_before);
    }

    pub fn seek_to_word<S: Scheduler + ?Sized>(
        &mut self,
        index: usize,
        document: &Document,
        scheduler: &mut S,
    ) {
        let page_before = self.page(document);
        match self.state.mode {
            Mode::Sentence => {
                let sentence = document
                    .sentences()
                    .sentence_for_word(index.min(document.last_index()) as u32);
                self.place_sentence(document, sentence);
            }
            Mode::Word | Mode::Continuous => self.place_focus(document, index),
        }
        self.after_seek(document, scheduler, page_before);
    }

    pub fn seek_by_words<S: Scheduler + ?Sized>(
        &mut self,
        delta: i64,
        document: &Document,
        scheduler: &mut S,
    ) {
        let target = offset_index(self.focus_index(), delta);
        self.seek_to_word(target, document, scheduler);
    }

    /// Switches to `target`, translating the position: a word maps to the
    /// sentence containing it (focus moves to that sentence's first word),
    /// a scroll offset maps to the nearest word center and back.
    pub fn set_mode<S: Scheduler + ?Sized>(
        &mut self,
        target: Mode,
        document: &Document,
        scheduler: &mut S,
    ) {
        if target == self.state.mode {
            return;
        }

        let was_playing = self.state.is_playing || self.resume_armed;
        self.stop(scheduler);
        let page_before = self.page(document);

        let from = self.state.mode;
        self.state.mode = target;
        match target {
            Mode::Sentence => {
                let sentence = document
                    .sentences()
                    .sentence_for_word(self.state.focus_index);
                self.place_sentence(document, sentence);
            }
            Mode::Word | Mode::Continuous => {
                let focus = self.focus_index();
                self.place_focus(document, focus);
            }
        }

        debug!(
            "clock: mode {:?} -> {:?} focus={} sentence={} offset={}",
            from,
            target,
            self.state.focus_index,
            self.state.sentence_index,
            self.state.scroll_offset
        );
        self.events.push(ReaderEvent::ModeChanged { mode: target });
        self.push_page(document, page_before);

        if was_playing {
            self.start(document, scheduler);
        }
    }

    /// Flips between word mode and the configured alternate mode.
    pub fn toggle_mode<S: Scheduler + ?Sized>(&mut self, document: &Document, scheduler: &mut S) {
        let target = if self.state.mode == Mode::Word {
            self.pacing.toggle_target
        } else {
            Mode::Word
        };
        self.set_mode(target, document, scheduler);
    }

    /// Applies a drag or wheel adjustment. Running playback is stopped and,
    /// when auto-resume is configured, restarted after an idle delay; more
    /// input before then pushes the delay out again.
    pub fn manual_scroll<S: Scheduler + ?Sized>(
        &mut self,
        input: ScrollInput,
        document: &Document,
        scheduler: &mut S,
    ) {
        if self.state.is_playing {
            self.halt(scheduler);
            self.resume_armed = true;
        }

        // a non-finite drag distance counts as no movement
        let input = match input {
            ScrollInput::Pixels(delta) if !delta.is_finite() => ScrollInput::Pixels(0.0),
            input => input,
        };

        let page_before = self.page(document);
        match (self.state.mode, input) {
            (Mode::Continuous, ScrollInput::Pixels(delta)) => {
                let offset = self.scroll_px + delta as f64;
                self.place_scroll(document, offset);
            }
            (Mode::Sentence, ScrollInput::Steps(steps)) => {
                let target = offset_index(self.sentence_index(), steps as i64);
                self.place_sentence(document, target);
            }
            (Mode::Sentence, ScrollInput::Pixels(delta)) => {
                let anchor = document.layout().center_of(self.focus_index()) + delta;
                let word = document.layout().nearest_index(anchor);
                let sentence = document.sentences().sentence_for_word(word as u32);
                self.place_sentence(document, sentence);
            }
            (Mode::Word, ScrollInput::Pixels(delta)) => {
                let anchor = document.layout().center_of(self.focus_index()) + delta;
                let word = document.layout().nearest_index(anchor);
                self.place_focus(document, word);
            }
            (Mode::Word | Mode::Continuous, ScrollInput::Steps(steps)) => {
                let target = offset_index(self.focus_index(), steps as i64);
                self.place_focus(document, target);
            }
        }
        self.push_page(document, page_before);

        if let Some(handle) = self.resume.take() {
            scheduler.cancel(handle);
        }
        if self.resume_armed {
            match self.pacing.auto_resume_ms {
                Some(delay_ms) => {
                    self.resume = Some(scheduler.schedule_after(delay_ms));
                    debug!("clock: manual scroll, resume in {}ms", delay_ms);
                }
                None => self.resume_armed = false,
            }
        }
    }

    /// Replaces the state with a restored one. Every field is clamped to the
    /// document; the authoritative position field depends on the mode.
    /// Playback always comes back paused.
    pub fn restore<S: Scheduler + ?Sized>(
        &mut self,
        restored: &PlaybackState,
        document: &Document,
        scheduler: &mut S,
    ) {
        self.stop(scheduler);

        self.state.mode = restored.mode;
        self.state.wpm = self.pacing.clamp_wpm(restored.wpm);
        self.recalibrate(document);
        match restored.mode {
            Mode::Word => self.place_focus(document, restored.focus_index as usize),
            Mode::Sentence => self.place_sentence(document, restored.sentence_index as usize),
            Mode::Continuous => self.place_scroll(document, restored.scroll_offset as f64),
        }

        debug!(
            "clock: restored mode={:?} focus={} sentence={} offset={} wpm={}",
            self.state.mode,
            self.state.focus_index,
            self.state.sentence_index,
            self.state.scroll_offset,
            self.state.wpm
        );
        self.events.push(ReaderEvent::ModeChanged {
            mode: self.state.mode,
        });
        self.events.push(ReaderEvent::SpeedChanged {
            wpm: self.state.wpm,
        });
    }

    fn after_seek<S: Scheduler + ?Sized>(
        &mut self,
        document: &Document,
        scheduler: &mut S,
        page_before: (u32, u32),
    ) {
        self.push_page(document, page_before);
        if self.state.is_playing {
            self.install_schedule(document, scheduler);
        }
    }
}

fn offset_index(current: usize, delta: i64) -> usize {
    if delta >= 0 {
        current.saturating_add(delta as usize)
    } else {
        current.saturating_sub(delta.unsigned_abs() as usize)
    }
}
