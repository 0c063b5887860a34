//! Configuration for copycheck.
//!
//! Every field has a default, so an empty (or absent) config file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

use crate::language::LanguageTag;
use crate::plagiarism::DEFAULT_PLAGIARISM_THRESHOLD;
use crate::similarity::{DEFAULT_EDIT_DISTANCE_CAP, DEFAULT_JACCARD_WEIGHT};

/// Config file names searched for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["copycheck.yaml", ".copycheck.yaml"];

/// Corpus file name used when no path is configured.
const DEFAULT_CORPUS_FILE: &str = "corpus.db";

/// Storage engine for the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SQLite database file.
    #[default]
    Sqlite,
    /// In-memory partitions snapshotted to a JSON file.
    Memory,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Path of the corpus file (default: per-user data directory)
    pub corpus: Option<PathBuf>,
    pub backend: Backend,
    /// Percentage a submission must strictly exceed to be flagged
    pub plagiarism_threshold: f64,
    /// Leading characters compared by the edit-distance metric
    pub edit_distance_cap: usize,
    /// Weight of vocabulary overlap; edit similarity gets the remainder
    pub jaccard_weight: f64,
    /// Language reported when classification finds nothing
    pub default_language: String,
    /// Time allowed for a single scoring call
    pub scoring_timeout_ms: u64,
    /// Likelihood (0-1) reported when scoring fails or times out
    pub default_ai_likelihood: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: None,
            backend: Backend::default(),
            plagiarism_threshold: DEFAULT_PLAGIARISM_THRESHOLD,
            edit_distance_cap: DEFAULT_EDIT_DISTANCE_CAP,
            jaccard_weight: DEFAULT_JACCARD_WEIGHT,
            default_language: LanguageTag::Python.as_str().to_string(),
            scoring_timeout_ms: 30_000,
            default_ai_likelihood: 0.0,
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a config from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load `path` if given, else a discovered config file, else defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => Self::parse_file(p)?,
            None => match discover() {
                Some(p) => Self::parse_file(p)?,
                None => Self::default(),
            },
        };
        validate(&config)?;
        Ok(config)
    }

    /// The default language as a tag.
    pub fn default_language(&self) -> anyhow::Result<LanguageTag> {
        LanguageTag::parse(&self.default_language)
            .ok_or_else(|| anyhow::anyhow!("unknown default_language {:?}", self.default_language))
    }

    pub fn scoring_timeout(&self) -> Duration {
        Duration::from_millis(self.scoring_timeout_ms)
    }

    /// The configured corpus path, or the per-user default.
    pub fn corpus_path(&self) -> PathBuf {
        if let Some(path) = &self.corpus {
            return path.clone();
        }
        let file = match self.backend {
            Backend::Sqlite => DEFAULT_CORPUS_FILE.to_string(),
            Backend::Memory => "corpus.json".to_string(),
        };
        ProjectDirs::from("", "", "copycheck")
            .map(|dirs| dirs.data_dir().join(&file))
            .unwrap_or_else(|| PathBuf::from(format!("copycheck-{}", file)))
    }
}

/// Look for a config file in the current directory.
pub fn discover() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if !(0.0..=100.0).contains(&config.plagiarism_threshold) {
        anyhow::bail!(
            "plagiarism_threshold must be within 0-100, got {}",
            config.plagiarism_threshold
        );
    }

    if !(0.0..=1.0).contains(&config.jaccard_weight) {
        anyhow::bail!(
            "jaccard_weight must be within 0-1, got {}",
            config.jaccard_weight
        );
    }

    if config.edit_distance_cap == 0 {
        anyhow::bail!("edit_distance_cap must be positive");
    }

    if !(0.0..=1.0).contains(&config.default_ai_likelihood) {
        anyhow::bail!(
            "default_ai_likelihood must be within 0-1, got {}",
            config.default_ai_likelihood
        );
    }

    config.default_language()?;

    Ok(())
}

/// Commented config written by `copycheck init`.
pub const TEMPLATE: &str = r#"# copycheck configuration

# Corpus location (default: per-user data directory)
# corpus: ./corpus.db

# Storage engine: sqlite or memory (JSON snapshot)
backend: sqlite

# Flag submissions whose best match strictly exceeds this percentage
plagiarism_threshold: 80.0

# Only the first N characters are compared by edit distance
edit_distance_cap: 5000

# Vocabulary overlap weight; edit similarity gets 1 - jaccard_weight
jaccard_weight: 0.6

# Reported when neither the filename nor keywords identify the language
default_language: Python

# Scoring calls longer than this fall back to default_ai_likelihood
scoring_timeout_ms: 30000
default_ai_likelihood: 0.0
"#;
