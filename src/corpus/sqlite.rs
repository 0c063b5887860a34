//! SQLite-backed corpus.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use super::{CorpusError, CorpusStore, Submission, SubmissionId};
use crate::language::LanguageTag;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    language TEXT NOT NULL,
    code TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_submissions_language ON submissions(language);
"#;

/// Corpus stored in a single SQLite table.
///
/// Appends go through one writer connection behind a mutex; every append is
/// one INSERT, so readers never observe a partial submission. File-backed
/// corpora run in WAL mode and serve each read from its own read-only
/// connection, so readers do not wait on each other or on the writer lock.
pub struct SqliteCorpus {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteCorpus {
    /// Open (or create) the corpus database at `path`.
    ///
    /// Missing parent directories and the schema are created on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(journal_mode = %mode, "corpus database configured");
        info!("corpus database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create a throwaway in-memory database.
    pub fn in_memory() -> Result<Self, CorpusError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Path of the database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` on a connection suitable for reading.
    ///
    /// In-memory databases exist only on the writer connection.
    fn with_reader<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, CorpusError> {
        match &self.path {
            Some(path) => {
                let reader = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                Ok(f(&reader)?)
            }
            None => {
                let conn = self.conn.lock();
                Ok(f(&*conn)?)
            }
        }
    }
}

impl CorpusStore for SqliteCorpus {
    fn append(&self, language: LanguageTag, code: &str) -> Result<SubmissionId, CorpusError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO submissions (language, code) VALUES (?1, ?2)",
            params![language.as_str(), code],
        )?;
        let id = SubmissionId(conn.last_insert_rowid());
        debug!(%id, %language, "appended submission");
        Ok(id)
    }

    fn query(&self, language: LanguageTag) -> Result<Vec<Submission>, CorpusError> {
        self.with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, code FROM submissions WHERE language = ?1 ORDER BY id ASC")?;
            let rows = stmt
                .query_map(params![language.as_str()], |row| {
                    Ok(Submission {
                        id: SubmissionId(row.get(0)?),
                        language,
                        code: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>();
            rows
        })
    }

    fn count(&self, language: LanguageTag) -> Result<usize, CorpusError> {
        let count: i64 = self.with_reader(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM submissions WHERE language = ?1",
                params![language.as_str()],
                |row| row.get(0),
            )
        })?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_query_by_language() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        let a = corpus.append(LanguageTag::Python, "print(1)").unwrap();
        let b = corpus.append(LanguageTag::Rust, "fn main() {}").unwrap();
        let c = corpus.append(LanguageTag::Python, "print(2)").unwrap();
        assert!(a < b && b < c);

        let python = corpus.query(LanguageTag::Python).unwrap();
        assert_eq!(python.len(), 2);
        assert_eq!(python[0].id, a);
        assert_eq!(python[0].code, "print(1)");
        assert_eq!(python[1].id, c);
        assert!(python.iter().all(|s| s.language == LanguageTag::Python));

        assert!(corpus.query(LanguageTag::Go).unwrap().is_empty());
        assert_eq!(corpus.count(LanguageTag::Rust).unwrap(), 1);
    }

    #[test]
    fn test_open_creates_directories_and_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("corpus.db");

        {
            let corpus = SqliteCorpus::open(&path).unwrap();
            assert_eq!(corpus.path(), Some(path.as_path()));
            assert!(corpus.query(LanguageTag::Java).unwrap().is_empty());
            corpus.append(LanguageTag::Java, "class A {}").unwrap();
        }

        assert!(path.exists());
        let reopened = SqliteCorpus::open(&path).unwrap();
        let java = reopened.query(LanguageTag::Java).unwrap();
        assert_eq!(java.len(), 1);
        assert_eq!(java[0].code, "class A {}");
    }

    #[test]
    fn test_language_column_uses_display_name() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        corpus.append(LanguageTag::CSharp, "using System;").unwrap();
        let stored: String = corpus
            .conn
            .lock()
            .query_row("SELECT language FROM submissions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "C#");
    }

    #[test]
    fn test_reads_do_not_wait_on_writer_lock() {
        let temp = TempDir::new().unwrap();
        let corpus = SqliteCorpus::open(temp.path().join("corpus.db")).unwrap();
        corpus.append(LanguageTag::Ruby, "puts 1").unwrap();

        let _writer = corpus.conn.lock();
        let ruby = corpus.query(LanguageTag::Ruby).unwrap();
        assert_eq!(ruby.len(), 1);
        assert_eq!(corpus.count(LanguageTag::Ruby).unwrap(), 1);
    }

    #[test]
    fn test_concurrent_readers_see_committed_rows() {
        let temp = TempDir::new().unwrap();
        let corpus = std::sync::Arc::new(SqliteCorpus::open(temp.path().join("c.db")).unwrap());
        for i in 0..5 {
            corpus.append(LanguageTag::Go, &format!("package p{}", i)).unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let corpus = std::sync::Arc::clone(&corpus);
                std::thread::spawn(move || corpus.query(LanguageTag::Go).unwrap().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 5);
        }
    }

    #[test]
    fn test_stats() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        corpus.append(LanguageTag::Go, "package main").unwrap();
        corpus.append(LanguageTag::Go, "package util").unwrap();
        corpus.append(LanguageTag::Cpp, "int main() {}").unwrap();
        assert_eq!(
            corpus.stats().unwrap(),
            vec![(LanguageTag::Cpp, 1), (LanguageTag::Go, 2)]
        );
    }
}
