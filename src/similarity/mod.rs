//! Lexical similarity between two code texts.
//!
//! Two independent metrics are combined linearly:
//!
//! - **Jaccard** overlap of the token vocabularies, robust to formatting.
//! - **Normalized edit similarity** over the raw characters, which rewards
//!   near-identical structure.
//!
//! Both metrics are symmetric and total: empty inputs have a defined score.

mod tokenizer;

pub use tokenizer::{token_set, tokenize};

use std::collections::HashSet;

/// Default weight of the Jaccard metric; the edit metric gets the remainder.
pub const DEFAULT_JACCARD_WEIGHT: f64 = 0.6;

/// Default number of leading characters compared by the edit metric.
pub const DEFAULT_EDIT_DISTANCE_CAP: usize = 5000;

/// Jaccard index of two token sets. Two empty sets are identical (1.0).
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Levenshtein distance with unit costs.
///
/// Uses two rolling rows sized by the shorter input, so memory is
/// O(min(n, m)) while time stays O(n * m).
pub fn edit_distance(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return long.len();
    }
    if long == short {
        return 0;
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr: Vec<usize> = vec![0; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let cost = if lc == sc { 0 } else { 1 };
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// `1 - distance / max_len` over the first `cap` characters of each text,
/// floored at 0. Two empty (truncated) texts score 1.0.
pub fn normalized_edit_similarity(a: &str, b: &str, cap: usize) -> f64 {
    let a: Vec<char> = a.chars().take(cap).collect();
    let b: Vec<char> = b.chars().take(cap).collect();
    normalized_edit_similarity_chars(&a, &b)
}

fn normalized_edit_similarity_chars(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = edit_distance(a, b);
    (1.0 - distance as f64 / max_len as f64).max(0.0)
}

/// A code text pre-processed for repeated comparisons.
///
/// The plagiarism detector compares one submission against a whole corpus
/// partition; preparing it once avoids re-tokenizing per comparison.
#[derive(Debug, Clone)]
pub struct Fingerprint<'a> {
    tokens: HashSet<&'a str>,
    chars: Vec<char>,
}

/// Weighted combination of the two metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityEngine {
    jaccard_weight: f64,
    edit_cap: usize,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self {
            jaccard_weight: DEFAULT_JACCARD_WEIGHT,
            edit_cap: DEFAULT_EDIT_DISTANCE_CAP,
        }
    }
}

impl SimilarityEngine {
    /// Create an engine. `jaccard_weight` is clamped to [0, 1] and a zero cap
    /// is raised to one character.
    pub fn new(jaccard_weight: f64, edit_cap: usize) -> Self {
        Self {
            jaccard_weight: jaccard_weight.clamp(0.0, 1.0),
            edit_cap: edit_cap.max(1),
        }
    }

    pub fn jaccard_weight(&self) -> f64 {
        self.jaccard_weight
    }

    pub fn edit_weight(&self) -> f64 {
        1.0 - self.jaccard_weight
    }

    pub fn edit_cap(&self) -> usize {
        self.edit_cap
    }

    /// Tokenize and truncate `code` once for repeated comparisons.
    pub fn fingerprint<'a>(&self, code: &'a str) -> Fingerprint<'a> {
        Fingerprint {
            tokens: token_set(code),
            chars: code.chars().take(self.edit_cap).collect(),
        }
    }

    /// Combined similarity in [0, 1].
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.compare(&self.fingerprint(a), &self.fingerprint(b))
    }

    /// Combined similarity of two prepared texts.
    pub fn compare(&self, a: &Fingerprint<'_>, b: &Fingerprint<'_>) -> f64 {
        let vocabulary = jaccard(&a.tokens, &b.tokens);
        let structure = normalized_edit_similarity_chars(&a.chars, &b.chars);
        let score = self.jaccard_weight * vocabulary + self.edit_weight() * structure;
        score.clamp(0.0, 1.0)
    }
}
