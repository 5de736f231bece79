//! Whitespace tokenization shared by the loader and the sentence mapper.

/// Splits source text into the canonical word sequence.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut cursor = 0usize;

    while let Some((word, next_cursor)) = next_word_at(text, cursor) {
        words.push(word.to_owned());
        cursor = next_cursor;
    }

    words
}

pub fn count_words(text: &str) -> usize {
    let mut count = 0usize;
    let mut cursor = 0usize;

    while let Some((_, next_cursor)) = next_word_at(text, cursor) {
        count += 1;
        cursor = next_cursor;
    }

    count
}

/// Next whitespace-delimited word at or after byte offset `cursor`.
pub(crate) fn next_word_at(text: &str, cursor: usize) -> Option<(&str, usize)> {
    let rest = text.get(cursor..)?;
    let start = cursor + rest.find(|ch: char| !ch.is_whitespace())?;
    let end = text[start..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| start + offset);

    Some((&text[start..end], end))
}
