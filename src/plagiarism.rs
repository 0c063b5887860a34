//! Plagiarism detection against a same-language corpus partition.
//!
//! The score of a submission is the highest pairwise similarity against any
//! previous submission, as a percentage. Comparisons are independent, so they
//! run in parallel with a max-reduction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{Submission, SubmissionId};
use crate::similarity::SimilarityEngine;

/// Percentage a submission must strictly exceed to be flagged.
pub const DEFAULT_PLAGIARISM_THRESHOLD: f64 = 80.0;

/// Outcome of comparing one submission against a corpus partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismReport {
    /// Highest similarity found, in [0, 100].
    pub percentage: f64,
    pub is_plagiarized: bool,
    /// The most similar previous submission (lowest id on ties).
    pub best_match: Option<SubmissionId>,
}

/// Compares new code against previous submissions.
#[derive(Debug, Clone, Copy)]
pub struct PlagiarismDetector {
    engine: SimilarityEngine,
    threshold: f64,
}

impl Default for PlagiarismDetector {
    fn default() -> Self {
        Self::new(SimilarityEngine::default(), DEFAULT_PLAGIARISM_THRESHOLD)
    }
}

impl PlagiarismDetector {
    pub fn new(engine: SimilarityEngine, threshold: f64) -> Self {
        Self { engine, threshold }
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `percentage` is over the threshold (strictly).
    pub fn is_plagiarized(&self, percentage: f64) -> bool {
        percentage > self.threshold
    }

    /// Highest similarity of `new_code` to any of `previous`, as a
    /// percentage. An empty `previous` yields 0.
    pub fn detect<S: AsRef<str> + Sync>(&self, new_code: &str, previous: &[S]) -> f64 {
        let fingerprint = self.engine.fingerprint(new_code);
        previous
            .par_iter()
            .map(|code| self.engine.compare(&fingerprint, &self.engine.fingerprint(code.as_ref())))
            .reduce(|| 0.0, f64::max)
            * 100.0
    }

    /// Compare against stored submissions, keeping track of the best match.
    pub fn check(&self, new_code: &str, previous: &[Submission]) -> PlagiarismReport {
        let fingerprint = self.engine.fingerprint(new_code);
        let best = previous
            .par_iter()
            .map(|s| {
                let score = self.engine.compare(&fingerprint, &self.engine.fingerprint(&s.code));
                (score, s.id)
            })
            .reduce_with(|a, b| {
                if b.0 > a.0 || (b.0 == a.0 && b.1 < a.1) {
                    b
                } else {
                    a
                }
            });

        let (percentage, best_match) = match best {
            Some((score, id)) => (score * 100.0, Some(id)),
            None => (0.0, None),
        };
        debug!(
            compared = previous.len(),
            percentage,
            best_match = ?best_match,
            "plagiarism check complete"
        );

        PlagiarismReport {
            percentage,
            is_plagiarized: self.is_plagiarized(percentage),
            best_match,
        }
    }
}
