//! Presentation engine for rapid serial visual presentation reading.
//!
//! A document's words are laid out once on a single infinite line. The
//! [`PlaybackClock`] walks that layout word by word, sentence by sentence or
//! as a continuous scroll, and the [`LineComposer`] folds the layout back
//! into screen lines around the current focus word. [`ReaderSession`] ties
//! the pieces together for a host application.

pub mod clock;
pub mod compose;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod layout;
pub mod measure;
pub mod render;
pub mod schedule;
pub mod segment;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod text;

pub use clock::{PageDirection, PlaybackClock, ScrollInput, TickResult};
pub use compose::{ComposedLine, ComposedLines, LineComposer, PlacedWord};
pub use config::ReaderConfig;
pub use document::{Document, DocumentIdentity, DocumentKind, SentenceSource};
pub use error::{ReaderError, SnapshotError};
pub use events::{Disposer, DisposerSet, EventHub, ReaderEvent};
pub use layout::{FocusSplit, Layout, WordPosition, center_index, split_focus};
pub use measure::{GlyphMetrics, Measurer, MonospaceMetrics};
pub use render::{FocusWord, ReadingView, StatusLine};
pub use schedule::{Scheduler, TimerHandle, TimerQueue};
pub use segment::{AbbreviationSet, SentenceMap, SentenceSegmenter, SentenceSpan};
pub use session::ReaderSession;
pub use snapshot::{Snapshot, SnapshotCodec, ViewKind};
pub use state::{Mode, PlaybackState};
pub use text::{count_words, tokenize};
