use pretty_assertions::assert_eq;

use super::*;
use crate::{
    document::{DocumentIdentity, DocumentKind, SentenceSource},
    measure::{Measurer, MonospaceMetrics},
    schedule::{Scheduler, TimerQueue},
    segment::SentenceSegmenter,
    text::tokenize,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Op {
    Install(TimerHandle),
    Cancel(TimerHandle),
}

/// Records every install and cancel on top of a real queue.
#[derive(Default)]
struct SpyScheduler {
    queue: TimerQueue,
    log: Vec<Op>,
}

impl SpyScheduler {
    fn installs(&self) -> Vec<TimerHandle> {
        self.log
            .iter()
            .filter_map(|op| match op {
                Op::Install(handle) => Some(*handle),
                Op::Cancel(_) => None,
            })
            .collect()
    }

    /// Every install after the first must come after the previous handle
    /// was cancelled.
    fn assert_cancel_before_install(&self) {
        let mut live: Option<TimerHandle> = None;
        for op in &self.log {
            match *op {
                Op::Install(handle) => {
                    assert_eq!(live, None, "install {handle:?} while another is live");
                    live = Some(handle);
                }
                Op::Cancel(handle) => {
                    if live == Some(handle) {
                        live = None;
                    }
                }
            }
        }
    }
}

impl Scheduler for SpyScheduler {
    fn schedule_after(&mut self, delay_ms: u32) -> TimerHandle {
        let handle = self.queue.schedule_after(delay_ms);
        self.log.push(Op::Install(handle));
        handle
    }

    fn schedule_every(&mut self, interval_ms: u32) -> TimerHandle {
        let handle = self.queue.schedule_every(interval_ms);
        self.log.push(Op::Install(handle));
        handle
    }

    fn schedule_frame(&mut self) -> TimerHandle {
        let handle = self.queue.schedule_frame();
        self.log.push(Op::Install(handle));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.log.push(Op::Cancel(handle));
        self.queue.cancel(handle);
    }
}

const SENTENCES: &str = "One two three. Four five six seven. Alpha beta gamma delta epsilon \
zeta. End here.";

fn build(words: Vec<String>) -> Document {
    let mut measurer = Measurer::new(Box::new(MonospaceMetrics::new(10.0, 2.0)), "mono", 20.0);
    Document::build(
        DocumentIdentity::new("doc", "Doc", DocumentKind::Text),
        words,
        SentenceSource::Segment(&SentenceSegmenter::default()),
        &mut measurer,
        5.0,
    )
    .unwrap()
}

fn numbered(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("w{index}")).collect()
}

fn config() -> ReaderConfig {
    ReaderConfig {
        wpm: 300,
        auto_resume_ms: Some(1_000),
        ..ReaderConfig::default()
    }
}

/// Polls `queue` at `from_ms` and then every `step_ms` up to `to_ms`,
/// firing whatever is due. Returns the time `until` first held, if it did.
fn drive(
    clock: &mut PlaybackClock,
    document: &Document,
    queue: &mut TimerQueue,
    from_ms: u64,
    to_ms: u64,
    step_ms: u64,
    until: impl Fn(&PlaybackClock) -> bool,
) -> Option<u64> {
    let mut now = from_ms;
    loop {
        for handle in queue.poll(now) {
            clock.fire(handle, now, document, queue);
        }
        if until(clock) {
            return Some(now);
        }
        if now >= to_ms {
            return None;
        }
        now = (now + step_ms).min(to_ms);
    }
}

#[test]
fn word_mode_reaches_last_word_in_a_minute() {
    let document = build(numbered(300));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.start(&document, &mut queue);
    let reached = drive(&mut clock, &document, &mut queue, 0, 70_000, 10, |clock| {
        clock.focus_index() == 299
    })
    .unwrap();

    assert!((59_800..=60_000).contains(&reached), "reached at {reached}");
    assert!(clock.is_playing());

    drive(&mut clock, &document, &mut queue, reached, 60_400, 10, |_| false);
    assert!(!clock.is_playing());
    assert_eq!(clock.focus_index(), 299);
    assert_eq!(queue.pending(), 0);
    assert!(clock.drain_events().contains(&ReaderEvent::Finished));
}

#[test]
fn double_start_installs_one_schedule() {
    let document = build(numbered(20));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut spy = SpyScheduler::default();

    clock.start(&document, &mut spy);
    clock.start(&document, &mut spy);

    assert_eq!(spy.installs().len(), 1);
    assert_eq!(spy.queue.pending(), 1);
    spy.assert_cancel_before_install();
}

#[test]
fn speed_change_reschedules_without_moving() {
    let document = build(numbered(50));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut spy = SpyScheduler::default();

    clock.start(&document, &mut spy);
    for now in [200, 400, 600] {
        for handle in spy.queue.poll(now) {
            clock.fire(handle, now, &document, &mut spy);
        }
    }
    assert_eq!(clock.focus_index(), 3);

    clock.set_speed(600, &document, &mut spy);
    assert_eq!(clock.focus_index(), 3);
    assert_eq!(clock.wpm(), 600);
    assert_eq!(spy.installs().len(), 2);
    assert_eq!(spy.queue.pending(), 1);
    spy.assert_cancel_before_install();

    // new interval is 100ms from the moment of the change
    assert!(spy.queue.poll(699).is_empty());
    let due = spy.queue.poll(700);
    assert_eq!(due.len(), 1);
    clock.fire(due[0], 700, &document, &mut spy);
    assert_eq!(clock.focus_index(), 4);
}

#[test]
fn speed_is_clamped_and_stepped() {
    let document = build(numbered(5));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.set_speed(0, &document, &mut queue);
    assert_eq!(clock.wpm(), 50);
    clock.adjust_speed(true, &document, &mut queue);
    assert_eq!(clock.wpm(), 60);
    clock.set_speed(u16::MAX, &document, &mut queue);
    assert_eq!(clock.wpm(), 1_000);
    clock.adjust_speed(true, &document, &mut queue);
    assert_eq!(clock.wpm(), 1_000);
}

#[test]
fn word_pages_jump_and_clamp() {
    let document = build(numbered(650));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.seek_to_word(50, &document, &mut queue);
    assert_eq!(clock.page(&document), (1, 3));

    clock.seek_page(PageDirection::Next, &document, &mut queue);
    assert_eq!(clock.focus_index(), 300);
    clock.seek_page(PageDirection::Next, &document, &mut queue);
    assert_eq!(clock.focus_index(), 600);
    clock.seek_page(PageDirection::Next, &document, &mut queue);
    assert_eq!(clock.focus_index(), 649);
    assert_eq!(clock.page(&document), (3, 3));

    clock.seek_page(PageDirection::Previous, &document, &mut queue);
    assert_eq!(clock.focus_index(), 300);
    clock.seek_page(PageDirection::Previous, &document, &mut queue);
    clock.seek_page(PageDirection::Previous, &document, &mut queue);
    assert_eq!(clock.focus_index(), 0);
    assert!(!clock.is_playing());
}

#[test]
fn sentence_pages_jump_by_sentence_count() {
    let document = build(tokenize(&"Short one. ".repeat(25)));
    assert_eq!(document.sentence_count(), 25);
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.set_mode(Mode::Sentence, &document, &mut queue);
    clock.seek_page(PageDirection::Next, &document, &mut queue);
    assert_eq!(clock.sentence_index(), 10);
    assert_eq!(clock.focus_index(), 20);
    assert_eq!(clock.page(&document), (2, 3));

    clock.seek_page(PageDirection::Next, &document, &mut queue);
    clock.seek_page(PageDirection::Next, &document, &mut queue);
    assert_eq!(clock.sentence_index(), 24);
}

#[test]
fn seek_while_playing_wins_over_pending_tick() {
    let document = build(numbered(100));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.start(&document, &mut queue);
    let in_flight = queue.poll(200);
    assert_eq!(in_flight.len(), 1);

    clock.seek_to_word(40, &document, &mut queue);
    for handle in in_flight {
        assert_eq!(
            clock.fire(handle, 200, &document, &mut queue),
            TickResult::NoRender
        );
    }
    assert_eq!(clock.focus_index(), 40);
    assert!(clock.is_playing());

    drive(&mut clock, &document, &mut queue, 200, 400, 10, |_| false);
    assert_eq!(clock.focus_index(), 41);
}

#[test]
fn toggle_to_sentence_and_back_lands_on_sentence_start() {
    let document = build(tokenize(SENTENCES));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    // fifth word of the third sentence
    clock.seek_to_word(11, &document, &mut queue);
    assert_eq!(document.word(11), Some("epsilon"));

    clock.toggle_mode(&document, &mut queue);
    assert_eq!(clock.mode(), Mode::Sentence);
    assert_eq!(clock.sentence_index(), 2);
    assert_eq!(clock.focus_index(), 7);

    clock.toggle_mode(&document, &mut queue);
    assert_eq!(clock.mode(), Mode::Word);
    assert_eq!(clock.focus_index(), 7);
}

#[test]
fn toggle_restarts_playback_and_ignores_old_handle() {
    let document = build(tokenize(SENTENCES));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut spy = SpyScheduler::default();

    clock.start(&document, &mut spy);
    let old = clock.active_advance().unwrap();
    clock.toggle_mode(&document, &mut spy);

    assert!(clock.is_playing());
    assert_ne!(clock.active_advance(), Some(old));
    assert_eq!(spy.queue.pending(), 1);
    assert_eq!(
        clock.fire(old, 200, &document, &mut spy),
        TickResult::NoRender
    );
    assert_eq!(clock.sentence_index(), 0);
    spy.assert_cancel_before_install();
}

#[test]
fn sentence_mode_holds_each_sentence_for_its_length() {
    let document = build(tokenize(SENTENCES));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.set_mode(Mode::Sentence, &document, &mut queue);
    clock.start(&document, &mut queue);

    // 3 words at 300 wpm
    assert!(queue.poll(599).is_empty());
    for handle in queue.poll(600) {
        clock.fire(handle, 600, &document, &mut queue);
    }
    assert_eq!(clock.sentence_index(), 1);
    assert_eq!(clock.focus_index(), 3);

    // 4 words
    assert!(queue.poll(1_399).is_empty());
    for handle in queue.poll(1_400) {
        clock.fire(handle, 1_400, &document, &mut queue);
    }
    assert_eq!(clock.sentence_index(), 2);

    drive(&mut clock, &document, &mut queue, 1_400, 10_000, 50, |_| false);
    assert_eq!(clock.sentence_index(), 3);
    assert!(!clock.is_playing());
}

#[test]
fn continuous_speed_matches_average_word_width() {
    let document = build(vec![String::from("abcd"); 40]);
    let config = ReaderConfig {
        wpm: 600,
        ..config()
    };
    let mut clock = PlaybackClock::new(&config, &document);

    // 42px word + 5px spacing, 100ms per word
    assert!((clock.pixels_per_ms() - 0.47).abs() < 1e-9);

    let mut queue = TimerQueue::new();
    clock.set_mode(Mode::Continuous, &document, &mut queue);
    let start = clock.state().scroll_offset;
    assert_eq!(start, 26.0);

    clock.start(&document, &mut queue);
    drive(&mut clock, &document, &mut queue, 0, 1_000, 10, |_| false);

    let moved = clock.state().scroll_offset - start;
    assert!((moved - 470.0).abs() < 0.05, "moved {moved}");
    assert_eq!(clock.focus_index(), 10);
}

#[test]
fn continuous_speed_change_applies_from_next_frame() {
    let document = build(vec![String::from("abcd"); 40]);
    let config = ReaderConfig {
        wpm: 600,
        ..config()
    };
    let mut clock = PlaybackClock::new(&config, &document);
    let mut queue = TimerQueue::new();

    clock.set_mode(Mode::Continuous, &document, &mut queue);
    let start = clock.scroll_position();
    clock.start(&document, &mut queue);
    drive(&mut clock, &document, &mut queue, 0, 500, 10, |_| false);
    let handle = clock.active_advance();
    assert!((clock.scroll_position() - start - 235.0).abs() < 1e-6);

    clock.set_speed(300, &document, &mut queue);
    assert!((clock.pixels_per_ms() - 0.235).abs() < 1e-9);
    assert_eq!(clock.active_advance(), handle);

    drive(&mut clock, &document, &mut queue, 500, 1_500, 10, |_| false);
    let moved = clock.scroll_position() - start;
    assert!((moved - 470.0).abs() < 1e-6, "moved {moved}");
    assert!(clock.is_playing());
}

#[test]
fn leaving_continuous_picks_nearest_word_center() {
    let document = build(vec![String::from("abcd"); 10]);

    // centers sit at 26 and 73
    for (drag, expected) in [(20.0, 0), (30.0, 1)] {
        let mut clock = PlaybackClock::new(&config(), &document);
        let mut queue = TimerQueue::new();
        clock.set_mode(Mode::Continuous, &document, &mut queue);
        clock.manual_scroll(ScrollInput::Pixels(drag), &document, &mut queue);
        assert_eq!(clock.state().scroll_offset, 26.0 + drag);

        clock.set_mode(Mode::Word, &document, &mut queue);
        assert_eq!(clock.mode(), Mode::Word);
        assert_eq!(clock.focus_index(), expected);
        assert_eq!(
            clock.state().scroll_offset,
            document.layout().center_of(expected)
        );
    }
}

#[test]
fn continuous_speed_holds_deep_into_long_documents() {
    let document = build(vec![String::from("abcdefgh"); 200_000]);
    let config = ReaderConfig {
        wpm: 50,
        ..config()
    };
    let mut moved = Vec::new();

    for step in [10, 40] {
        let mut clock = PlaybackClock::new(&config, &document);
        let mut queue = TimerQueue::new();
        clock.set_mode(Mode::Continuous, &document, &mut queue);
        clock.seek_to_word(190_000, &document, &mut queue);
        let start = clock.scroll_position();
        assert!(start > 16_000_000.0, "start {start}");

        clock.start(&document, &mut queue);
        drive(&mut clock, &document, &mut queue, 0, 10_000, step, |_| false);
        assert!(clock.is_playing());

        let distance = clock.scroll_position() - start;
        let expected = clock.pixels_per_ms() * 10_000.0;
        assert!((distance - expected).abs() < 1e-3, "step {step}: moved {distance}");
        moved.push(distance);
    }

    assert!((moved[0] - moved[1]).abs() < 1e-3);
}

#[test]
fn continuous_distance_ignores_frame_rate() {
    let document = build(vec![String::from("abcd"); 40]);
    let mut offsets = Vec::new();

    for step in [10, 25, 40] {
        let mut clock = PlaybackClock::new(&config(), &document);
        let mut queue = TimerQueue::new();
        clock.set_mode(Mode::Continuous, &document, &mut queue);
        clock.start(&document, &mut queue);
        drive(&mut clock, &document, &mut queue, 0, 2_000, step, |_| false);
        offsets.push(clock.state().scroll_offset);
    }

    assert!((offsets[0] - offsets[1]).abs() < 0.05);
    assert!((offsets[0] - offsets[2]).abs() < 0.05);
}

#[test]
fn continuous_stops_at_last_center() {
    let document = build(vec![String::from("abcd"); 5]);
    let config = ReaderConfig {
        wpm: 1_000,
        ..config()
    };
    let mut clock = PlaybackClock::new(&config, &document);
    let mut queue = TimerQueue::new();

    clock.set_mode(Mode::Continuous, &document, &mut queue);
    clock.start(&document, &mut queue);
    drive(&mut clock, &document, &mut queue, 0, 5_000, 16, |_| false);

    assert!(!clock.is_playing());
    assert_eq!(clock.state().scroll_offset, document.layout().last_center());
    assert_eq!(clock.focus_index(), 4);
    assert_eq!(queue.pending(), 0);
}

#[test]
fn continuous_scroll_clamps_drag() {
    let document = build(vec![String::from("abcd"); 5]);
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.set_mode(Mode::Continuous, &document, &mut queue);
    clock.manual_scroll(ScrollInput::Pixels(-10_000.0), &document, &mut queue);
    assert_eq!(clock.state().scroll_offset, 0.0);
    assert_eq!(clock.focus_index(), 0);

    clock.manual_scroll(ScrollInput::Pixels(f32::MAX), &document, &mut queue);
    assert_eq!(clock.state().scroll_offset, document.layout().last_center());
    assert_eq!(clock.focus_index(), 4);
    assert_eq!(clock.pending_resume(), None);
}

#[test]
fn non_finite_drag_does_not_move() {
    let document = build(numbered(100));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.seek_to_word(40, &document, &mut queue);
    clock.manual_scroll(ScrollInput::Pixels(f32::NAN), &document, &mut queue);
    assert_eq!(clock.focus_index(), 40);

    let document = build(tokenize(SENTENCES));
    let mut clock = PlaybackClock::new(&config(), &document);
    clock.seek_to_word(4, &document, &mut queue);
    clock.set_mode(Mode::Sentence, &document, &mut queue);
    assert_eq!(clock.sentence_index(), 1);

    clock.manual_scroll(ScrollInput::Pixels(f32::INFINITY), &document, &mut queue);
    assert_eq!(clock.sentence_index(), 1);
    assert_eq!(clock.focus_index(), 3);

    clock.set_mode(Mode::Continuous, &document, &mut queue);
    let offset = clock.state().scroll_offset;
    clock.manual_scroll(ScrollInput::Pixels(f32::NEG_INFINITY), &document, &mut queue);
    assert_eq!(clock.state().scroll_offset, offset);
    assert_eq!(clock.focus_index(), 3);
}

#[test]
fn manual_scroll_pauses_then_resumes_once() {
    let document = build(numbered(100));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut spy = SpyScheduler::default();

    clock.start(&document, &mut spy);
    clock.manual_scroll(ScrollInput::Steps(3), &document, &mut spy);
    assert!(!clock.is_playing());
    assert_eq!(clock.focus_index(), 3);
    let first_resume = clock.pending_resume().unwrap();

    spy.queue.poll(600);
    clock.manual_scroll(ScrollInput::Steps(-1), &document, &mut spy);
    let second_resume = clock.pending_resume().unwrap();
    assert_ne!(first_resume, second_resume);
    assert!(!spy.queue.is_pending(first_resume));
    assert_eq!(spy.queue.pending(), 1);

    // the re-armed delay counts from the second input
    assert!(spy.queue.poll(1_599).is_empty());
    let due = spy.queue.poll(1_600);
    assert_eq!(due, vec![second_resume]);
    clock.fire(due[0], 1_600, &document, &mut spy);

    assert!(clock.is_playing());
    assert_eq!(clock.focus_index(), 2);
    assert_eq!(clock.pending_resume(), None);
    assert_eq!(spy.queue.pending(), 1);
}

#[test]
fn manual_scroll_while_paused_does_not_resume() {
    let document = build(numbered(10));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.manual_scroll(ScrollInput::Steps(500), &document, &mut queue);
    assert_eq!(clock.focus_index(), 9);
    assert_eq!(clock.pending_resume(), None);
    assert_eq!(queue.pending(), 0);
}

#[test]
fn explicit_stop_cancels_auto_resume() {
    let document = build(numbered(10));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.start(&document, &mut queue);
    clock.manual_scroll(ScrollInput::Steps(1), &document, &mut queue);
    assert!(clock.pending_resume().is_some());

    clock.stop(&mut queue);
    assert_eq!(clock.pending_resume(), None);
    assert_eq!(queue.pending(), 0);
}

#[test]
fn disabled_auto_resume_leaves_playback_stopped() {
    let document = build(numbered(10));
    let config = ReaderConfig {
        auto_resume_ms: None,
        ..config()
    };
    let mut clock = PlaybackClock::new(&config, &document);
    let mut queue = TimerQueue::new();

    clock.start(&document, &mut queue);
    clock.manual_scroll(ScrollInput::Steps(1), &document, &mut queue);
    assert!(!clock.is_playing());
    assert_eq!(queue.pending(), 0);
}

#[test]
fn restore_clamps_out_of_range_fields() {
    let document = build(tokenize(SENTENCES));
    let mut clock = PlaybackClock::new(&config(), &document);
    let mut queue = TimerQueue::new();

    clock.restore(
        &PlaybackState {
            mode: Mode::Sentence,
            is_playing: true,
            focus_index: 9_999,
            sentence_index: 9_999,
            scroll_offset: -4.0,
            wpm: 9_999,
        },
        &document,
        &mut queue,
    );

    assert_eq!(clock.sentence_index(), 3);
    assert_eq!(clock.focus_index(), 13);
    assert_eq!(clock.wpm(), 1_000);
    assert!(!clock.is_playing());
    assert_eq!(queue.pending(), 0);
}
