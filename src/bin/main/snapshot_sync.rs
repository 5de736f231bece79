use glance_core::Snapshot;
use log::{debug, warn};

use super::{SNAPSHOT_SAVE_DEBOUNCE_MS, snapshot_file::SnapshotFile};

/// Writes the reading position at most once per debounce window.
pub(super) struct SnapshotSyncState {
    last_saved: Option<Snapshot>,
    /// Newest unsaved snapshot and when the first unsaved change was seen.
    pending: Option<(Snapshot, u64)>,
}

impl SnapshotSyncState {
    pub(super) fn new(initial: Option<Snapshot>) -> Self {
        Self {
            last_saved: initial,
            pending: None,
        }
    }

    pub(super) fn track_current(&mut self, current: Snapshot, now_ms: u64) {
        if self.last_saved.as_ref() == Some(&current) {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some((pending, _)) => {
                if *pending != current {
                    *pending = current;
                }
            }
            None => {
                self.pending = Some((current, now_ms));
            }
        }
    }

    pub(super) fn flush_if_due(&mut self, store: Option<&SnapshotFile>, now_ms: u64) {
        let Some((_, changed_at_ms)) = self.pending.as_ref() else {
            return;
        };

        if now_ms.saturating_sub(*changed_at_ms) < SNAPSHOT_SAVE_DEBOUNCE_MS {
            return;
        }

        if let Some((candidate, _)) = self.pending.take() {
            if !self.save(candidate.clone(), store) {
                // retry on the next window
                self.pending = Some((candidate, now_ms));
            }
        }
    }

    /// Saves `current` right away unless it is already on disk.
    pub(super) fn flush_now(&mut self, current: Snapshot, store: Option<&SnapshotFile>) {
        self.pending = None;
        if self.last_saved.as_ref() != Some(&current) {
            self.save(current, store);
        }
    }

    fn save(&mut self, candidate: Snapshot, store: Option<&SnapshotFile>) -> bool {
        match store {
            Some(store) => match store.save(&candidate) {
                Ok(()) => {
                    debug!(
                        "snapshot-save: flushed word={} path={}",
                        candidate.playback.focus_index + 1,
                        store.path().display()
                    );
                    self.last_saved = Some(candidate);
                    true
                }
                Err(err) => {
                    warn!("snapshot-save: failed: {:#}", err);
                    false
                }
            },
            None => {
                self.last_saved = Some(candidate);
                true
            }
        }
    }
}
