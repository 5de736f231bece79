//! Change notifications and scoped listener registration.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::state::Mode;

/// Discrete UI-state signals emitted by the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReaderEvent {
    Loaded { word_count: u32, sentence_count: u32 },
    Unloaded,
    PlaybackChanged { playing: bool },
    ModeChanged { mode: Mode },
    PositionChanged { focus_index: u32, sentence_index: u32 },
    PageChanged { page: u32, total: u32 },
    SpeedChanged { wpm: u16 },
    /// Playback ran off the end of the document.
    Finished,
}

type Listener = Box<dyn FnMut(&ReaderEvent)>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Fan-out of [`ReaderEvent`]s to registered listeners.
///
/// Listeners must not subscribe or dispose from inside a notification.
#[derive(Clone, Default)]
pub struct EventHub {
    slots: Rc<RefCell<Slots>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Disposer
    where
        F: FnMut(&ReaderEvent) + 'static,
    {
        let mut slots = self.slots.borrow_mut();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.listeners.push((id, Box::new(listener)));

        Disposer {
            id,
            slots: Rc::downgrade(&self.slots),
        }
    }

    pub fn emit(&self, event: &ReaderEvent) {
        for (_, listener) in self.slots.borrow_mut().listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.slots.borrow().listeners.len()
    }
}

/// Detaches one listener. Cloneable and idempotent; disposing after the hub
/// is gone does nothing.
#[derive(Clone, Debug)]
pub struct Disposer {
    id: u64,
    slots: Weak<RefCell<Slots>>,
}

impl Disposer {
    pub fn dispose(&self) {
        if let Some(slots) = self.slots.upgrade() {
            slots
                .borrow_mut()
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// Disposers collected for one scope, released together.
#[derive(Debug, Default)]
pub struct DisposerSet {
    disposers: Vec<Disposer>,
}

impl DisposerSet {
    pub fn push(&mut self, disposer: Disposer) {
        self.disposers.push(disposer);
    }

    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }

    pub fn dispose_all(&mut self) {
        for disposer in self.disposers.drain(..) {
            disposer.dispose();
        }
    }
}

impl Drop for DisposerSet {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
