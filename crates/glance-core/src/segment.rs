//! Heuristic sentence segmentation and the sentence-to-word map.

use std::collections::HashSet;

use heapless::String as HeaplessString;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::text::count_words;

/// Longest word that can still be looked up as an abbreviation.
const ABBREVIATION_BYTES: usize = 24;

const DEFAULT_ABBREVIATIONS: &[&str] = &[
    // titles
    "mr", "mrs", "ms", "dr", "prof", "sr", "sra", "srta", "jr", "st", "rev", "hon", "gen", "gov",
    "sgt", "cpl", "lt", "col", "maj", "capt", "cmdr", "adm", "pres", "messrs", "mme", "mlle",
    "dña", "fr",
    // units and measures
    "mm", "cm", "km", "kg", "mg", "lb", "lbs", "oz", "ft", "yd", "mi", "sq", "approx", "vol",
    "vols", "pp", "fig", "figs", "ch", "hr", "hrs", "dept", "inc", "corp", "ltd", "co",
    // days and months
    "mon", "tue", "tues", "wed", "thu", "thur", "thurs", "fri", "jan", "feb", "mar", "apr", "jun",
    "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    // latin
    "etc", "vs", "viz", "cf", "al", "ca", "e.g", "i.e", "a.m", "p.m", "ibid", "op", "u.s", "u.k",
];

fn is_stop(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn is_closing_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '\u{201d}' | '\u{2019}' | '\u{00bb}' | ')')
}

fn is_opening_mark(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '\u{201c}' | '\u{2018}' | '\u{00ab}' | '(' | '\u{00bf}' | '\u{00a1}'
    )
}

/// Words whose trailing period does not end a sentence. Lookups are
/// case-insensitive and any single letter counts as an initial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbbreviationSet {
    words: HashSet<String>,
}

impl Default for AbbreviationSet {
    fn default() -> Self {
        Self::new(DEFAULT_ABBREVIATIONS.iter().copied())
    }
}

impl AbbreviationSet {
    pub fn new<'a, I>(words: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.trim_end_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn insert(&mut self, word: &str) {
        self.words.insert(word.trim_end_matches('.').to_lowercase());
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim_end_matches(is_stop);
        let mut chars = word.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            return first.is_alphabetic();
        }

        let mut lowered = HeaplessString::<ABBREVIATION_BYTES>::new();
        for ch in word.chars().flat_map(char::to_lowercase) {
            if lowered.push(ch).is_err() {
                return false;
            }
        }
        self.words.contains(lowered.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SentenceSegmenter {
    abbreviations: AbbreviationSet,
}

impl SentenceSegmenter {
    pub fn new(abbreviations: AbbreviationSet) -> Self {
        Self { abbreviations }
    }

    pub fn abbreviations(&self) -> &AbbreviationSet {
        &self.abbreviations
    }

    /// Splits `text` into trimmed sentences. Trailing text without terminal
    /// punctuation becomes the last sentence.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut sentence_start = 0usize;

        for (position, &(offset, ch)) in chars.iter().enumerate() {
            if offset < sentence_start || !is_stop(ch) {
                continue;
            }
            if self.abbreviations.contains(preceding_word(text, offset)) {
                continue;
            }
            let Some(end) = boundary_end(text, &chars, position) else {
                continue;
            };

            let sentence = text[sentence_start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_owned());
            }
            sentence_start = end;
        }

        let rest = text[sentence_start..].trim();
        if !rest.is_empty() {
            sentences.push(rest.to_owned());
        }

        sentences
    }
}

/// Word immediately before the stop at byte `offset`, without leading
/// opening marks.
fn preceding_word(text: &str, offset: usize) -> &str {
    let head = &text[..offset];
    let start = head
        .rfind(char::is_whitespace)
        .map_or(0, |index| index + head[index..].chars().next().map_or(1, char::len_utf8));
    head[start..].trim_start_matches(is_opening_mark)
}

/// Byte offset where the sentence ending at `chars[position]` stops, or
/// `None` when the stop is not a boundary.
fn boundary_end(text: &str, chars: &[(usize, char)], position: usize) -> Option<usize> {
    let mut next = position + 1;
    match chars.get(next) {
        None => return Some(text.len()),
        Some(&(_, ch)) if ch.is_whitespace() => {}
        Some(&(_, ch)) if is_closing_quote(ch) => {
            next += 1;
            match chars.get(next) {
                None => return Some(text.len()),
                Some(&(_, ch)) if ch.is_whitespace() => {}
                Some(_) => return None,
            }
        }
        Some(_) => return None,
    }
    let end = chars[next].0;

    let mut lookahead = chars[next..].iter().map(|&(_, ch)| ch).skip_while(|ch| ch.is_whitespace());
    loop {
        match lookahead.next() {
            None => return Some(end),
            Some(ch) if is_opening_mark(ch) => continue,
            Some(ch) if ch.is_uppercase() => return Some(end),
            Some(_) => return None,
        }
    }
}

/// One sentence and the inclusive range of words it covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceSpan {
    pub sentence_index: u32,
    pub start_word_index: u32,
    pub end_word_index: u32,
    pub text: String,
}

impl SentenceSpan {
    pub fn word_count(&self) -> u32 {
        self.end_word_index - self.start_word_index + 1
    }

    pub fn contains(&self, word_index: u32) -> bool {
        (self.start_word_index..=self.end_word_index).contains(&word_index)
    }
}

/// Contiguous, ordered spans that jointly cover every word of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentenceMap {
    spans: Vec<SentenceSpan>,
}

impl SentenceMap {
    /// Segments the words joined by single spaces and aligns sentences to
    /// word indices by each sentence's own word count.
    pub fn from_words<S: AsRef<str>>(words: &[S], segmenter: &SentenceSegmenter) -> Self {
        let joined = join_words(words);
        Self::align(segmenter.segment(&joined), words)
    }

    /// Builds spans from caller-supplied sentence lengths in words. Lengths
    /// of zero are skipped; a shortfall extends the last span and any excess
    /// is cut at the last word.
    pub fn from_lengths<S: AsRef<str>>(words: &[S], lengths: &[usize]) -> Self {
        let mut sentences = Vec::with_capacity(lengths.len());
        let mut cursor = 0usize;
        for &length in lengths {
            if length == 0 || cursor >= words.len() {
                continue;
            }
            let end = (cursor + length).min(words.len());
            sentences.push(join_words(&words[cursor..end]));
            cursor = end;
        }
        Self::align(sentences, words)
    }

    fn align<S: AsRef<str>>(sentences: Vec<String>, words: &[S]) -> Self {
        let word_count = words.len();
        let mut spans: Vec<SentenceSpan> = Vec::with_capacity(sentences.len());
        let mut cursor = 0usize;

        for text in sentences {
            if cursor >= word_count {
                debug!(
                    "segment: sentence {:?} past last word, dropped",
                    text.chars().take(32).collect::<String>()
                );
                break;
            }
            let length = count_words(&text).max(1);
            let end = (cursor + length).min(word_count);
            spans.push(SentenceSpan {
                sentence_index: spans.len() as u32,
                start_word_index: cursor as u32,
                end_word_index: (end - 1) as u32,
                text,
            });
            cursor = end;
        }

        if cursor < word_count {
            match spans.last_mut() {
                Some(last) => {
                    debug!(
                        "segment: {} trailing words folded into sentence {}",
                        word_count - cursor,
                        last.sentence_index
                    );
                    last.end_word_index = (word_count - 1) as u32;
                    last.text.push(' ');
                    last.text.push_str(&join_words(&words[cursor..]));
                }
                None => spans.push(SentenceSpan {
                    sentence_index: 0,
                    start_word_index: 0,
                    end_word_index: (word_count - 1) as u32,
                    text: join_words(words),
                }),
            }
        }

        Self { spans }
    }

    pub fn spans(&self) -> &[SentenceSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, sentence_index: usize) -> Option<&SentenceSpan> {
        self.spans.get(sentence_index)
    }

    /// Index of the sentence containing `word_index`, clamped to the last
    /// sentence.
    pub fn sentence_for_word(&self, word_index: u32) -> usize {
        let after = self
            .spans
            .partition_point(|span| span.end_word_index < word_index);
        after.min(self.spans.len().saturating_sub(1))
    }
}

fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    let mut joined = String::new();
    for (index, word) in words.iter().enumerate() {
        if index > 0 {
            joined.push(' ');
        }
        joined.push_str(word.as_ref());
    }
    joined
}
