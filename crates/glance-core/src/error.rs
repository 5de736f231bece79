//! Errors that cross the engine boundary.

use thiserror::Error;

/// Rejected operation. Only raised by document loading and configuration
/// checks; everything else is clamped or degraded in place.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ReaderError {
    #[error("document contains no words")]
    EmptyDocument,

    #[error("word {index} is empty")]
    EmptyWord { index: usize },

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}

/// Why a snapshot record could not be decoded.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SnapshotError {
    #[error("snapshot record is truncated")]
    Truncated,

    #[error("snapshot record has an unknown magic")]
    BadMagic,

    #[error("snapshot version {0} is not supported")]
    UnsupportedVersion(u8),

    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("snapshot field `{0}` holds an invalid value")]
    InvalidField(&'static str),
}
