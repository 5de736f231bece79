use log::{debug, trace};

use super::{PlaybackClock, TickResult};
use crate::{
    document::Document,
    events::ReaderEvent,
    schedule::{Scheduler, TimerHandle},
    state::Mode,
};

impl PlaybackClock {
    /// `Ready -> Playing`. Starting while already playing does nothing, so
    /// a double start never installs a second schedule.
    pub fn start<S: Scheduler + ?Sized>(&mut self, document: &Document, scheduler: &mut S) {
        self.resume_armed = false;
        if let Some(handle) = self.resume.take() {
            scheduler.cancel(handle);
        }
        if self.state.is_playing {
            return;
        }

        self.state.is_playing = true;
        debug!(
            "clock: start mode={:?} wpm={} focus={} sentence={}",
            self.state.mode, self.state.wpm, self.state.focus_index, self.state.sentence_index
        );
        self.install_schedule(document, scheduler);
        self.events.push(ReaderEvent::PlaybackChanged { playing: true });
    }

    /// `Playing -> Ready`. Idempotent; also drops a pending auto-resume.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.resume_armed = false;
        if let Some(handle) = self.resume.take() {
            scheduler.cancel(handle);
        }
        self.halt(scheduler);
    }

    pub fn toggle_playback<S: Scheduler + ?Sized>(
        &mut self,
        document: &Document,
        scheduler: &mut S,
    ) {
        if self.state.is_playing {
            self.stop(scheduler);
        } else {
            self.start(document, scheduler);
        }
    }

    /// Cancels every handle the clock holds. Used on teardown.
    pub fn cancel_all<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.stop(scheduler);
        self.last_frame_ms = None;
    }

    /// Routes a firing from the scheduler. Handles the clock no longer holds
    /// are ignored.
    pub fn fire<S: Scheduler + ?Sized>(
        &mut self,
        handle: TimerHandle,
        now_ms: u64,
        document: &Document,
        scheduler: &mut S,
    ) -> TickResult {
        if self.advance == Some(handle) {
            return self.advance_step(now_ms, document, scheduler);
        }

        if self.resume == Some(handle) {
            self.resume = None;
            if self.resume_armed {
                debug!("clock: auto-resume after manual scroll");
                self.start(document, scheduler);
                return TickResult::RenderRequested;
            }
            return TickResult::NoRender;
        }

        trace!("clock: stale handle={} ignored", handle.id());
        TickResult::NoRender
    }

    fn advance_step<S: Scheduler + ?Sized>(
        &mut self,
        now_ms: u64,
        document: &Document,
        scheduler: &mut S,
    ) -> TickResult {
        let page_before = self.page(document);

        let result = match self.state.mode {
            Mode::Word => {
                let next = self.focus_index() + 1;
                if next > document.last_index() {
                    self.finish(scheduler);
                } else {
                    self.place_focus(document, next);
                }
                TickResult::RenderRequested
            }
            Mode::Sentence => {
                // one-shot; consumed by this firing
                self.advance = None;
                let next = self.sentence_index() + 1;
                if next >= document.sentence_count() {
                    self.finish(scheduler);
                } else {
                    self.place_sentence(document, next);
                    let delay = self.sentence_delay_ms(document);
                    self.advance = Some(scheduler.schedule_after(delay));
                }
                TickResult::RenderRequested
            }
            Mode::Continuous => {
                self.advance = None;
                let elapsed = self
                    .last_frame_ms
                    .map_or(0, |last| now_ms.saturating_sub(last));
                self.last_frame_ms = Some(now_ms);

                let last_center = document.layout().last_center() as f64;
                let offset = self.scroll_px + self.pixels_per_ms * elapsed as f64;
                if offset >= last_center {
                    self.place_scroll(document, last_center);
                    self.finish(scheduler);
                } else {
                    self.place_scroll(document, offset);
                    self.advance = Some(scheduler.schedule_frame());
                }

                if elapsed == 0 {
                    TickResult::NoRender
                } else {
                    TickResult::RenderRequested
                }
            }
        };

        self.push_page(document, page_before);
        result
    }

    /// Cancels the advance handle and replaces it with a fresh one for the
    /// current mode. No-op while stopped.
    pub(super) fn install_schedule<S: Scheduler + ?Sized>(
        &mut self,
        document: &Document,
        scheduler: &mut S,
    ) {
        if let Some(handle) = self.advance.take() {
            scheduler.cancel(handle);
        }
        if !self.state.is_playing {
            return;
        }

        let handle = match self.state.mode {
            Mode::Word => scheduler.schedule_every(self.word_interval_ms()),
            Mode::Sentence => scheduler.schedule_after(self.sentence_delay_ms(document)),
            Mode::Continuous => {
                self.last_frame_ms = None;
                scheduler.schedule_frame()
            }
        };
        trace!(
            "clock: installed handle={} mode={:?}",
            handle.id(),
            self.state.mode
        );
        self.advance = Some(handle);
    }

    /// Stops the advance without touching a pending auto-resume.
    pub(super) fn halt<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.advance.take() {
            scheduler.cancel(handle);
        }
        self.last_frame_ms = None;

        if self.state.is_playing {
            self.state.is_playing = false;
            debug!(
                "clock: stop mode={:?} focus={}",
                self.state.mode, self.state.focus_index
            );
            self.events.push(ReaderEvent::PlaybackChanged { playing: false });
        }
    }

    fn finish<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        debug!(
            "clock: reached end mode={:?} focus={}",
            self.state.mode, self.state.focus_index
        );
        self.stop(scheduler);
        self.events.push(ReaderEvent::Finished);
    }
}
