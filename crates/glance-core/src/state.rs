//! Playback state shared by the clock, the session and the snapshot codec.

use serde::{Deserialize, Serialize};

/// Presentation mode of the playback clock.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Word,
    Sentence,
    Continuous,
}

impl Mode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Word => "Word",
            Self::Sentence => "Sentence",
            Self::Continuous => "Continuous",
        }
    }

    pub(crate) const fn to_byte(self) -> u8 {
        match self {
            Self::Word => 0,
            Self::Sentence => 1,
            Self::Continuous => 2,
        }
    }

    pub(crate) const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Word),
            1 => Some(Self::Sentence),
            2 => Some(Self::Continuous),
            _ => None,
        }
    }
}

/// Current reading position and speed.
///
/// `scroll_offset` is in pixels along the laid-out text axis. Outside of
/// continuous mode it tracks the focus word's center position so that a mode
/// switch never has to guess.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub mode: Mode,
    pub is_playing: bool,
    pub focus_index: u32,
    pub sentence_index: u32,
    pub scroll_offset: f32,
    pub wpm: u16,
}

impl PlaybackState {
    pub const fn fresh(mode: Mode, wpm: u16) -> Self {
        Self {
            mode,
            is_playing: false,
            focus_index: 0,
            sentence_index: 0,
            scroll_offset: 0.0,
            wpm,
        }
    }
}
