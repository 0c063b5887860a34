//! Copycheck - submission analysis gate.
//!
//! Copycheck takes a code submission and reports three things: its language,
//! how closely it matches earlier submissions in that language, and how likely
//! it is to be machine-written. Submissions can optionally be committed to the
//! corpus so later ones are compared against them.
//!
//! # Architecture
//!
//! - `language`: language registry and classifier (extension, markers, keywords)
//! - `similarity`: tokenizer, Jaccard, bounded edit distance, combined score
//! - `corpus`: per-language submission store (SQLite or in-memory)
//! - `plagiarism`: best-match search over a corpus partition
//! - `scoring`: per-language authorship scorers with timeout and fallback
//! - `analyze`: request orchestrator
//! - `config`: YAML configuration
//! - `report`: output formatting (JSON, pretty)
//!
//! # Adding a New Scorer
//!
//! Implement `ScoringCapability` and register it with
//! `ScorerRegistry::with(language, scorer)`.

pub mod analyze;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod language;
pub mod plagiarism;
pub mod report;
pub mod scoring;
pub mod similarity;

pub use analyze::{AnalysisOutcome, AnalysisRequest, AnalysisResult, Analyzer, CommitStatus};
pub use config::Config;
pub use corpus::{CorpusError, CorpusStore, MemoryCorpus, SqliteCorpus, Submission, SubmissionId};
pub use language::{LanguageClassifier, LanguageRegistry, LanguageTag};
pub use plagiarism::{PlagiarismDetector, PlagiarismReport};
pub use scoring::{ScoreRunner, ScorerRegistry, ScoringCapability, ScoringError};
pub use similarity::SimilarityEngine;
