//! Last-known reading state and its compact binary record.
//!
//! Record layout, all integers little-endian:
//!
//! ```text
//! magic u32 | version u8
//! document: id str | title str | kind u8
//! view u8
//! playback: mode u8 | flags u8 | focus u32 | sentence u32 | scroll f32 bits | wpm u16
//! ui: count u32 | (key str | value str) * count
//! checksum u32 (FNV-1a over everything before it)
//! ```
//!
//! `str` is a u32 byte length followed by UTF-8.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    document::{DocumentIdentity, DocumentKind},
    error::SnapshotError,
    state::{Mode, PlaybackState},
};

const SNAPSHOT_MAGIC: u32 = 0x3153_4C47; // "GLS1"
const SNAPSHOT_VERSION: u8 = 1;
const HEADER_LEN: usize = 5;
const CHECKSUM_LEN: usize = 4;

const FLAG_PLAYING: u8 = 0x01;

/// Which screen the host was showing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    Library,
    PageViewer,
    #[default]
    Reader,
}

impl ViewKind {
    const fn to_byte(self) -> u8 {
        match self {
            Self::Library => 0,
            Self::PageViewer => 1,
            Self::Reader => 2,
        }
    }

    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Library),
            1 => Some(Self::PageViewer),
            2 => Some(Self::Reader),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub document: DocumentIdentity,
    pub view: ViewKind,
    pub playback: PlaybackState,
    /// Host-defined extras, carried through untouched.
    #[serde(default)]
    pub ui: BTreeMap<String, String>,
}

pub struct SnapshotCodec;

impl SnapshotCodec {
    pub fn encode(snapshot: &Snapshot) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&SNAPSHOT_MAGIC.to_le_bytes());
        out.push(SNAPSHOT_VERSION);

        put_str(&mut out, &snapshot.document.id);
        put_str(&mut out, &snapshot.document.title);
        out.push(snapshot.document.kind.to_byte());
        out.push(snapshot.view.to_byte());

        let playback = &snapshot.playback;
        out.push(playback.mode.to_byte());
        out.push(if playback.is_playing { FLAG_PLAYING } else { 0 });
        out.extend_from_slice(&playback.focus_index.to_le_bytes());
        out.extend_from_slice(&playback.sentence_index.to_le_bytes());
        out.extend_from_slice(&playback.scroll_offset.to_bits().to_le_bytes());
        out.extend_from_slice(&playback.wpm.to_le_bytes());

        out.extend_from_slice(&(snapshot.ui.len() as u32).to_le_bytes());
        for (key, value) in &snapshot.ui {
            put_str(&mut out, key);
            put_str(&mut out, value);
        }

        let checksum = checksum32(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
        debug!(
            "snapshot: encoded id={:?} bytes={}",
            snapshot.document.id,
            out.len()
        );
        out
    }

    /// "No snapshot available" on any failure.
    pub fn decode(bytes: &[u8]) -> Option<Snapshot> {
        match Self::try_decode(bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("snapshot: discarded record len={} err={}", bytes.len(), err);
                None
            }
        }
    }

    pub fn try_decode(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(SnapshotError::Truncated);
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::BadMagic);
        }
        if bytes[4] != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(bytes[4]));
        }

        let (body, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if checksum32(body) != expected {
            return Err(SnapshotError::ChecksumMismatch);
        }

        let mut reader = Reader::new(&body[HEADER_LEN..]);

        let id = reader.string("document.id")?;
        let title = reader.string("document.title")?;
        let kind = DocumentKind::from_byte(reader.u8()?)
            .ok_or(SnapshotError::InvalidField("document.kind"))?;
        let view = ViewKind::from_byte(reader.u8()?).ok_or(SnapshotError::InvalidField("view"))?;

        let mode = Mode::from_byte(reader.u8()?).ok_or(SnapshotError::InvalidField("mode"))?;
        let flags = reader.u8()?;
        if flags & !FLAG_PLAYING != 0 {
            return Err(SnapshotError::InvalidField("flags"));
        }
        let playback = PlaybackState {
            mode,
            is_playing: flags & FLAG_PLAYING != 0,
            focus_index: reader.u32()?,
            sentence_index: reader.u32()?,
            scroll_offset: f32::from_bits(reader.u32()?),
            wpm: reader.u16()?,
        };

        let count = reader.u32()?;
        let mut ui = BTreeMap::new();
        for _ in 0..count {
            let key = reader.string("ui.key")?;
            let value = reader.string("ui.value")?;
            ui.insert(key, value);
        }

        if !reader.is_empty() {
            return Err(SnapshotError::InvalidField("length"));
        }

        Ok(Snapshot {
            document: DocumentIdentity { id, title, kind },
            view,
            playback,
            ui,
        })
    }
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        if self.bytes.len() < len {
            return Err(SnapshotError::Truncated);
        }
        let (head, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, SnapshotError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, SnapshotError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self, field: &'static str) -> Result<String, SnapshotError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        core::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| SnapshotError::InvalidField(field))
    }
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}
