//! Corpus of previously analyzed submissions, partitioned by language.
//!
//! Backends implement [`CorpusStore`]; the orchestrator and plagiarism
//! detector only see the trait, so the storage engine can be swapped freely.
//!
//! - [`SqliteCorpus`]: embedded SQLite database (the default on disk).
//! - [`MemoryCorpus`]: per-language partitions behind reader-writer locks,
//!   optionally snapshotted to a JSON file.

mod memory;
mod sqlite;

pub use memory::MemoryCorpus;
pub use sqlite::SqliteCorpus;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Backend;
use crate::language::LanguageTag;

/// Errors raised by corpus backends.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("corpus I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corpus database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corpus snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Store-assigned submission identifier. Monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stored submission. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub language: LanguageTag,
    pub code: String,
}

/// Append/query contract shared by all corpus backends.
///
/// Implementations must make each append atomic: a concurrent `query` sees
/// either all of a submission or none of it. Results are in arrival order.
pub trait CorpusStore: Send + Sync {
    /// Store a submission and return its assigned id.
    fn append(&self, language: LanguageTag, code: &str) -> Result<SubmissionId, CorpusError>;

    /// All stored submissions for `language`, oldest first.
    fn query(&self, language: LanguageTag) -> Result<Vec<Submission>, CorpusError>;

    /// Number of stored submissions for `language`.
    fn count(&self, language: LanguageTag) -> Result<usize, CorpusError> {
        Ok(self.query(language)?.len())
    }

    /// Submission counts per language, in `LanguageTag::ALL` order, omitting
    /// empty partitions.
    fn stats(&self) -> Result<Vec<(LanguageTag, usize)>, CorpusError> {
        let mut stats = Vec::new();
        for tag in LanguageTag::ALL {
            let count = self.count(tag)?;
            if count > 0 {
                stats.push((tag, count));
            }
        }
        Ok(stats)
    }
}

/// Open the corpus at `path` with the given backend, creating it if absent.
pub fn open(backend: Backend, path: &Path) -> Result<Arc<dyn CorpusStore>, CorpusError> {
    let corpus: Arc<dyn CorpusStore> = match backend {
        Backend::Sqlite => Arc::new(SqliteCorpus::open(path)?),
        Backend::Memory => Arc::new(MemoryCorpus::with_snapshot(path)?),
    };
    Ok(corpus)
}
