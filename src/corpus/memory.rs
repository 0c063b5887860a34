//! In-memory corpus with independent per-language partitions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CorpusError, CorpusStore, Submission, SubmissionId};
use crate::language::LanguageTag;

type Partition = Arc<RwLock<Vec<Submission>>>;

/// On-disk snapshot layout.
#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    submissions: Vec<Submission>,
}

/// Corpus kept in memory, one reader-writer lock per language.
///
/// Appends to different languages never contend with each other. When a
/// snapshot path is configured, every append rewrites the snapshot file
/// (write to a temp file, then rename) before the submission becomes visible.
pub struct MemoryCorpus {
    partitions: RwLock<HashMap<LanguageTag, Partition>>,
    next_id: AtomicI64,
    snapshot: Option<PathBuf>,
    /// Serializes snapshot writers.
    snapshot_lock: Mutex<()>,
}

impl Default for MemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCorpus {
    /// An empty corpus that is never written to disk.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            snapshot: None,
            snapshot_lock: Mutex::new(()),
        }
    }

    /// Load a corpus from `path`, creating an empty one if the file is absent.
    /// Subsequent appends are persisted back to the same file.
    pub fn with_snapshot<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<Snapshot>(&content)?
        } else {
            Snapshot::default()
        };

        let mut grouped: HashMap<LanguageTag, Vec<Submission>> = HashMap::new();
        let mut max_id = 0;
        for submission in snapshot.submissions {
            max_id = max_id.max(submission.id.0);
            grouped.entry(submission.language).or_default().push(submission);
        }
        for partition in grouped.values_mut() {
            partition.sort_by_key(|s| s.id);
        }

        let total: usize = grouped.values().map(Vec::len).sum();
        info!("loaded {} submissions from {}", total, path.display());

        Ok(Self {
            partitions: RwLock::new(
                grouped
                    .into_iter()
                    .map(|(tag, subs)| (tag, Arc::new(RwLock::new(subs))))
                    .collect(),
            ),
            next_id: AtomicI64::new(max_id + 1),
            snapshot: Some(path),
            snapshot_lock: Mutex::new(()),
        })
    }

    /// The partition for `language`, created on first use.
    fn partition(&self, language: LanguageTag) -> Partition {
        if let Some(partition) = self.partitions.read().get(&language) {
            return Arc::clone(partition);
        }
        let mut partitions = self.partitions.write();
        Arc::clone(partitions.entry(language).or_default())
    }

    /// Existing partition for `language`, without creating one.
    fn existing_partition(&self, language: LanguageTag) -> Option<Partition> {
        self.partitions.read().get(&language).cloned()
    }

    /// Every stored submission plus `pending`, ordered by id.
    ///
    /// `held` is the partition whose write guard the caller already owns;
    /// its contents are passed in via `held_contents` instead of re-locking.
    fn collect_all(
        &self,
        held: LanguageTag,
        held_contents: &[Submission],
        pending: &Submission,
    ) -> Vec<Submission> {
        let partitions: Vec<(LanguageTag, Partition)> = self
            .partitions
            .read()
            .iter()
            .map(|(tag, p)| (*tag, Arc::clone(p)))
            .collect();

        let mut all = Vec::new();
        for (tag, partition) in partitions {
            if tag == held {
                all.extend_from_slice(held_contents);
            } else {
                all.extend(partition.read().iter().cloned());
            }
        }
        all.push(pending.clone());
        all.sort_by_key(|s| s.id);
        all
    }

    fn write_snapshot(path: &Path, submissions: Vec<Submission>) -> Result<(), CorpusError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&Snapshot { submissions })?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl CorpusStore for MemoryCorpus {
    fn append(&self, language: LanguageTag, code: &str) -> Result<SubmissionId, CorpusError> {
        // Snapshot writers take the global lock before any partition lock.
        let _snapshot_guard = self.snapshot.as_ref().map(|_| self.snapshot_lock.lock());

        let partition = self.partition(language);
        let mut entries = partition.write();

        let submission = Submission {
            id: SubmissionId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            language,
            code: code.to_string(),
        };

        if let Some(path) = &self.snapshot {
            let all = self.collect_all(language, &entries, &submission);
            Self::write_snapshot(path, all)?;
        }

        let id = submission.id;
        entries.push(submission);
        debug!(%id, %language, "appended submission");
        Ok(id)
    }

    fn query(&self, language: LanguageTag) -> Result<Vec<Submission>, CorpusError> {
        Ok(self
            .existing_partition(language)
            .map(|p| p.read().clone())
            .unwrap_or_default())
    }

    fn count(&self, language: LanguageTag) -> Result<usize, CorpusError> {
        Ok(self
            .existing_partition(language)
            .map(|p| p.read().len())
            .unwrap_or(0))
    }
}
