//! Word-level tokenizer for vocabulary comparison.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Any run of characters outside letters, digits and underscore.
    static ref NON_WORD: Regex = Regex::new(r"\W+").unwrap();
}

/// Split code into word-like tokens, dropping empty pieces.
pub fn tokenize(text: &str) -> Vec<&str> {
    NON_WORD.split(text).filter(|t| !t.is_empty()).collect()
}

/// The distinct tokens of `text`.
pub fn token_set(text: &str) -> HashSet<&str> {
    NON_WORD.split(text).filter(|t| !t.is_empty()).collect()
}
