//! The reading session: one explicit context object owning the current
//! document, its clock, the measurer and the scheduler.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::{
    clock::{PageDirection, PlaybackClock, ScrollInput, TickResult},
    compose::LineComposer,
    config::ReaderConfig,
    document::{Document, DocumentIdentity, SentenceSource},
    error::ReaderError,
    events::{Disposer, DisposerSet, EventHub, ReaderEvent},
    measure::{GlyphMetrics, Measurer},
    render::{ReadingView, StatusLine, status_line},
    schedule::{Scheduler, TimerHandle, TimerQueue},
    segment::SentenceSegmenter,
    snapshot::{Snapshot, ViewKind},
    state::{Mode, PlaybackState},
    text::tokenize,
};

struct Reading {
    document: Document,
    clock: PlaybackClock,
}

pub struct ReaderSession<S: Scheduler> {
    config: ReaderConfig,
    measurer: Measurer,
    segmenter: SentenceSegmenter,
    composer: LineComposer,
    scheduler: S,
    reading: Option<Reading>,
    events: EventHub,
    document_scope: DisposerSet,
}

impl<S: Scheduler> ReaderSession<S> {
    pub fn new(
        config: ReaderConfig,
        metrics: Box<dyn GlyphMetrics>,
        scheduler: S,
    ) -> Result<Self, ReaderError> {
        let config = config.validate()?;
        let measurer = Measurer::new(metrics, &config.font_family, config.font_size);
        let composer = LineComposer::from_config(&config);

        Ok(Self {
            config,
            measurer,
            segmenter: SentenceSegmenter::default(),
            composer,
            scheduler,
            reading: None,
            events: EventHub::new(),
            document_scope: DisposerSet::default(),
        })
    }

    pub fn with_segmenter(mut self, segmenter: SentenceSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Session-wide hub. Listeners added here outlive document reloads and
    /// are released through their own [`Disposer`].
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn is_loaded(&self) -> bool {
        self.reading.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.reading.as_ref().map(|reading| &reading.document)
    }

    pub fn clock(&self) -> Option<&PlaybackClock> {
        self.reading.as_ref().map(|reading| &reading.clock)
    }

    pub fn state(&self) -> Option<&PlaybackState> {
        self.clock().map(PlaybackClock::state)
    }

    /// Loads `words` with sentences found by the segmenter. On error the
    /// previous document, its position and its listeners stay as they were.
    pub fn load(
        &mut self,
        identity: DocumentIdentity,
        words: Vec<String>,
    ) -> Result<(), ReaderError> {
        self.load_from(identity, words, None)
    }

    pub fn load_text(&mut self, identity: DocumentIdentity, text: &str) -> Result<(), ReaderError> {
        self.load_from(identity, tokenize(text), None)
    }

    /// Loads `words` with precomputed sentence lengths, in words.
    pub fn load_with_sentences(
        &mut self,
        identity: DocumentIdentity,
        words: Vec<String>,
        sentence_lengths: &[usize],
    ) -> Result<(), ReaderError> {
        self.load_from(identity, words, Some(sentence_lengths))
    }

    fn load_from(
        &mut self,
        identity: DocumentIdentity,
        words: Vec<String>,
        sentence_lengths: Option<&[usize]>,
    ) -> Result<(), ReaderError> {
        if words.is_empty() {
            return Err(ReaderError::EmptyDocument);
        }
        if let Some(index) = words.iter().position(String::is_empty) {
            return Err(ReaderError::EmptyWord { index });
        }

        self.measurer.clear();
        let sentences = match sentence_lengths {
            Some(lengths) => SentenceSource::Lengths(lengths),
            None => SentenceSource::Segment(&self.segmenter),
        };
        let document = Document::build(
            identity,
            words,
            sentences,
            &mut self.measurer,
            self.config.word_spacing,
        )?;

        self.teardown();
        let clock = PlaybackClock::new(&self.config, &document);
        info!(
            "session: loaded id={:?} words={} sentences={} wpm={}",
            document.identity().id,
            document.word_count(),
            document.sentence_count(),
            clock.wpm()
        );
        self.events.emit(&ReaderEvent::Loaded {
            word_count: document.word_count() as u32,
            sentence_count: document.sentence_count() as u32,
        });
        self.reading = Some(Reading { document, clock });
        Ok(())
    }

    /// Cancels every timer, drops the document and releases document-scoped
    /// listeners.
    pub fn destroy(&mut self) {
        if self.reading.is_some() {
            info!("session: destroy");
        }
        self.teardown();
        self.measurer.clear();
    }

    fn teardown(&mut self) {
        if let Some(mut reading) = self.reading.take() {
            reading.clock.cancel_all(&mut self.scheduler);
            for event in reading.clock.drain_events() {
                self.events.emit(&event);
            }
            debug!(
                "session: unloaded id={:?} listeners={}",
                reading.document.identity().id,
                self.document_scope.len()
            );
            self.events.emit(&ReaderEvent::Unloaded);
        }
        self.document_scope.dispose_all();
    }

    /// Attaches a listener for the lifetime of the current document. The
    /// returned disposer may release it earlier.
    pub fn subscribe<F>(&mut self, listener: F) -> Disposer
    where
        F: FnMut(&ReaderEvent) + 'static,
    {
        let disposer = self.events.subscribe(listener);
        self.document_scope.push(disposer.clone());
        disposer
    }

    /// Runs `op` against the loaded document and forwards whatever the
    /// clock emitted. `None` when nothing is loaded.
    fn with_clock<R>(
        &mut self,
        op: impl FnOnce(&mut PlaybackClock, &Document, &mut S) -> R,
    ) -> Option<R> {
        let reading = self.reading.as_mut()?;
        let result = op(&mut reading.clock, &reading.document, &mut self.scheduler);
        for event in reading.clock.drain_events() {
            self.events.emit(&event);
        }
        Some(result)
    }

    /// Delivers a scheduler firing.
    pub fn fire(&mut self, handle: TimerHandle, now_ms: u64) -> TickResult {
        self.with_clock(|clock, document, scheduler| {
            clock.fire(handle, now_ms, document, scheduler)
        })
        .unwrap_or(TickResult::NoRender)
    }

    pub fn start(&mut self) {
        self.with_clock(|clock, document, scheduler| clock.start(document, scheduler));
    }

    pub fn stop(&mut self) {
        self.with_clock(|clock, _, scheduler| clock.stop(scheduler));
    }

    pub fn toggle_playback(&mut self) {
        self.with_clock(|clock, document, scheduler| clock.toggle_playback(document, scheduler));
    }

    pub fn set_speed(&mut self, wpm: u16) {
        self.with_clock(|clock, document, scheduler| clock.set_speed(wpm, document, scheduler));
    }

    pub fn adjust_speed(&mut self, increase: bool) {
        self.with_clock(|clock, document, scheduler| {
            clock.adjust_speed(increase, document, scheduler)
        });
    }

    pub fn seek_page(&mut self, direction: PageDirection) {
        self.with_clock(|clock, document, scheduler| {
            clock.seek_page(direction, document, scheduler)
        });
    }

    pub fn seek_to_word(&mut self, index: usize) {
        self.with_clock(|clock, document, scheduler| {
            clock.seek_to_word(index, document, scheduler)
        });
    }

    pub fn seek_by_words(&mut self, delta: i64) {
        self.with_clock(|clock, document, scheduler| {
            clock.seek_by_words(delta, document, scheduler)
        });
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.with_clock(|clock, document, scheduler| clock.set_mode(mode, document, scheduler));
    }

    pub fn toggle_mode(&mut self) {
        self.with_clock(|clock, document, scheduler| clock.toggle_mode(document, scheduler));
    }

    pub fn manual_scroll(&mut self, input: ScrollInput) {
        self.with_clock(|clock, document, scheduler| {
            clock.manual_scroll(input, document, scheduler)
        });
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        self.composer.set_viewport_width(viewport_width);
    }

    pub fn view(&self) -> Option<ReadingView<'_>> {
        self.reading
            .as_ref()
            .map(|reading| ReadingView::build(&reading.document, &reading.clock, &self.composer))
    }

    pub fn status(&self) -> Option<StatusLine> {
        self.reading
            .as_ref()
            .map(|reading| status_line(&reading.document, &reading.clock))
    }

    pub fn page(&self) -> Option<(u32, u32)> {
        self.reading
            .as_ref()
            .map(|reading| reading.clock.page(&reading.document))
    }

    pub fn progress(&self) -> Option<(u32, u32)> {
        self.reading
            .as_ref()
            .map(|reading| reading.clock.progress(&reading.document))
    }

    pub fn snapshot(&self, view: ViewKind, ui: BTreeMap<String, String>) -> Option<Snapshot> {
        self.reading.as_ref().map(|reading| Snapshot {
            document: reading.document.identity().clone(),
            view,
            playback: *reading.clock.state(),
            ui,
        })
    }

    /// Applies `snapshot` if it belongs to the loaded document. Playback is
    /// left paused either way.
    pub fn restore(&mut self, snapshot: &Snapshot) -> bool {
        let matches = self
            .document()
            .is_some_and(|document| document.identity().id == snapshot.document.id);
        if !matches {
            debug!(
                "session: snapshot for id={:?} ignored",
                snapshot.document.id
            );
            return false;
        }

        self.with_clock(|clock, document, scheduler| {
            clock.restore(&snapshot.playback, document, scheduler)
        })
        .is_some()
    }
}

impl ReaderSession<TimerQueue> {
    /// Polls the owned queue and delivers every due firing.
    pub fn pump(&mut self, now_ms: u64) -> TickResult {
        let mut result = TickResult::NoRender;
        for handle in self.scheduler.poll(now_ms) {
            if self.fire(handle, now_ms) == TickResult::RenderRequested {
                result = TickResult::RenderRequested;
            }
        }
        result
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due_ms()
    }
}
