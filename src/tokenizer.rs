//! Turns a free-text field into index tokens.
//!
//! A field yields its whole trimmed value, each whitespace-separated word of two or more
//! characters, and every prefix of such a word from two characters up to the full word.
//! Prefix tokens are what make type-ahead lookups hit before a word is finished.

use std::collections::HashSet;

/// Shortest word or prefix that becomes a token
pub const MIN_TOKEN_CHARS: usize = 2;

/// Tokenize `text`. Lower-cases internally so callers get the same set either way.
pub fn tokenize(text: &str) -> HashSet<String> {
    let normalized = text.trim().to_lowercase();
    let mut tokens = HashSet::new();

    if normalized.is_empty() {
        return tokens;
    }

    for word in normalized.split_whitespace() {
        if word.chars().count() < MIN_TOKEN_CHARS {
            continue;
        }

        // Each boundary ends a prefix of at least MIN_TOKEN_CHARS characters; the last is the word
        let boundaries = word
            .char_indices()
            .map(|(idx, _)| idx)
            .skip(MIN_TOKEN_CHARS)
            .chain(std::iter::once(word.len()));

        for end in boundaries {
            tokens.insert(word[..end].to_string());
        }
    }

    tokens.insert(normalized);
    tokens
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
