//! A loaded document: its words plus the derived positional and sentence
//! indexes.

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::ReaderError,
    layout::{Layout, WordPosition},
    measure::Measurer,
    segment::{SentenceMap, SentenceSegmenter, SentenceSpan},
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Epub,
    #[default]
    Text,
    Other,
}

impl DocumentKind {
    pub(crate) const fn to_byte(self) -> u8 {
        match self {
            Self::Pdf => 0,
            Self::Epub => 1,
            Self::Text => 2,
            Self::Other => 3,
        }
    }

    pub(crate) const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Pdf),
            1 => Some(Self::Epub),
            2 => Some(Self::Text),
            3 => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DocumentIdentity {
    pub id: String,
    pub title: String,
    pub kind: DocumentKind,
}

impl DocumentIdentity {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
        }
    }
}

/// Where sentence boundaries come from.
#[derive(Clone, Copy, Debug)]
pub enum SentenceSource<'a> {
    Segment(&'a SentenceSegmenter),
    /// Word counts per sentence, precomputed by the extraction side.
    Lengths(&'a [usize]),
}

#[derive(Clone, Debug)]
pub struct Document {
    identity: DocumentIdentity,
    words: Vec<String>,
    layout: Layout,
    sentences: SentenceMap,
}

impl Document {
    /// Builds every index up front. Fails without side effects other than
    /// filling the measurer's cache.
    pub fn build(
        identity: DocumentIdentity,
        words: Vec<String>,
        sentences: SentenceSource<'_>,
        measurer: &mut Measurer,
        spacing: f32,
    ) -> Result<Self, ReaderError> {
        let layout = Layout::build(&words, measurer, spacing)?;
        let sentences = match sentences {
            SentenceSource::Segment(segmenter) => SentenceMap::from_words(&words, segmenter),
            SentenceSource::Lengths(lengths) => SentenceMap::from_lengths(&words, lengths),
        };

        info!(
            "document: built id={:?} words={} sentences={} width={}",
            identity.id,
            words.len(),
            sentences.len(),
            layout.total_width()
        );

        Ok(Self {
            identity,
            words,
            layout,
            sentences,
        })
    }

    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn last_index(&self) -> usize {
        self.words.len().saturating_sub(1)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn positions(&self) -> &[WordPosition] {
        self.layout.positions()
    }

    pub fn sentences(&self) -> &SentenceMap {
        &self.sentences
    }

    pub fn sentence(&self, sentence_index: usize) -> Option<&SentenceSpan> {
        self.sentences.get(sentence_index)
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }
}
