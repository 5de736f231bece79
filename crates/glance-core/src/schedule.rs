//! Scheduling capability injected into the playback clock.
//!
//! The clock never sleeps or spawns anything itself. It asks a
//! [`Scheduler`] for a [`TimerHandle`], remembers the handle, and acts on a
//! firing only while that handle is still the one it holds. Hosts drive time
//! by polling a [`TimerQueue`] (or their own scheduler) and feeding every due
//! handle back through [`ReaderSession::fire`](crate::session::ReaderSession::fire).

use log::trace;

/// Cancellation token for one scheduled callback.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// One-shot callback `delay_ms` after now.
    fn schedule_after(&mut self, delay_ms: u32) -> TimerHandle;

    /// Periodic callback every `interval_ms`, first firing one interval from
    /// now.
    fn schedule_every(&mut self, interval_ms: u32) -> TimerHandle;

    /// One-shot callback on the next frame.
    fn schedule_frame(&mut self) -> TimerHandle;

    /// Cancelling an unknown or already fired handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Repeat {
    Once,
    Every { interval_ms: u64 },
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    handle: TimerHandle,
    origin_ms: u64,
    due_ms: u64,
    repeat: Repeat,
}

/// Deterministic polled scheduler.
///
/// Periodic entries compute each due time from their origin, so a host that
/// polls late catches up without drifting.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    /// Earliest due time, useful for hosts that sleep between polls.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.due_ms).min()
    }

    /// Advances the queue clock to `now_ms` and returns every handle due by
    /// then, earliest first. A periodic handle appears once per elapsed
    /// interval.
    pub fn poll(&mut self, now_ms: u64) -> Vec<TimerHandle> {
        self.now_ms = self.now_ms.max(now_ms);

        let mut fired: Vec<(u64, TimerHandle)> = Vec::new();
        self.entries.retain_mut(|entry| {
            while entry.due_ms <= now_ms {
                fired.push((entry.due_ms, entry.handle));
                match entry.repeat {
                    Repeat::Once => return false,
                    Repeat::Every { interval_ms } => {
                        let elapsed = entry.due_ms - entry.origin_ms + interval_ms;
                        entry.due_ms = entry.origin_ms + elapsed;
                    }
                }
            }
            true
        });

        fired.sort_by_key(|&(due_ms, handle)| (due_ms, handle));
        if !fired.is_empty() {
            trace!("timer: poll now={} fired={}", now_ms, fired.len());
        }
        fired.into_iter().map(|(_, handle)| handle).collect()
    }

    fn install(&mut self, delay_ms: u64, repeat: Repeat) -> TimerHandle {
        let handle = TimerHandle(self.next_id.max(1));
        self.next_id = handle.0 + 1;
        self.entries.push(Entry {
            handle,
            origin_ms: self.now_ms,
            due_ms: self.now_ms + delay_ms,
            repeat,
        });
        handle
    }
}

impl Scheduler for TimerQueue {
    fn schedule_after(&mut self, delay_ms: u32) -> TimerHandle {
        self.install(delay_ms as u64, Repeat::Once)
    }

    fn schedule_every(&mut self, interval_ms: u32) -> TimerHandle {
        let interval_ms = (interval_ms as u64).max(1);
        self.install(interval_ms, Repeat::Every { interval_ms })
    }

    fn schedule_frame(&mut self) -> TimerHandle {
        self.install(0, Repeat::Once)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|entry| entry.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_after(100);

        assert!(queue.poll(99).is_empty());
        assert_eq!(queue.poll(100), vec![handle]);
        assert!(queue.poll(500).is_empty());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn periodic_catches_up_without_drift() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_every(200);

        assert_eq!(queue.poll(450), vec![handle, handle]);
        assert_eq!(queue.next_due_ms(), Some(600));
        assert_eq!(queue.poll(600), vec![handle]);
    }

    #[test]
    fn cancelled_handles_never_fire() {
        let mut queue = TimerQueue::new();
        let kept = queue.schedule_after(10);
        let dropped = queue.schedule_every(5);
        queue.cancel(dropped);
        queue.cancel(TimerHandle::new(999));

        assert_eq!(queue.poll(50), vec![kept]);
    }

    #[test]
    fn frames_fire_on_next_poll_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.poll(1_000);
        let late = queue.schedule_after(5);
        let frame = queue.schedule_frame();

        assert_eq!(queue.poll(1_010), vec![frame, late]);
    }
}
