//! Integration tests for the full analysis pipeline.
//!
//! These run the orchestrator against real corpus backends on disk and check
//! the JSON record a caller would receive.

use std::sync::Arc;
use std::time::Duration;

use copycheck::corpus::{self, CorpusStore, MemoryCorpus, SqliteCorpus};
use copycheck::report;
use copycheck::scoring::{FixedScorer, ScoreRunner, ScorerRegistry, ScoringCapability, ScoringError};
use copycheck::{AnalysisRequest, Analyzer, CommitStatus, Config, LanguageTag};
use tempfile::TempDir;

/// Scorer that never finishes within any sensible timeout.
struct SlowScorer;

impl ScoringCapability for SlowScorer {
    fn name(&self) -> &str {
        "slow"
    }

    fn score(&self, _code: &str) -> Result<f64, ScoringError> {
        std::thread::sleep(Duration::from_secs(5));
        Ok(1.0)
    }
}

fn sqlite_corpus(temp: &TempDir) -> Arc<dyn CorpusStore> {
    let path = temp.path().join("data").join("corpus.db");
    Arc::new(SqliteCorpus::open(&path).expect("should create corpus"))
}

fn analyzer_with(corpus: Arc<dyn CorpusStore>, scorers: ScorerRegistry) -> Analyzer {
    Analyzer::new(corpus)
        .expect("should build analyzer")
        .scorers(scorers)
}

#[test]
fn test_end_to_end_python_submission() {
    let temp = TempDir::new().unwrap();
    let scorers = ScorerRegistry::new(Arc::new(FixedScorer::new(0.9)))
        .with(LanguageTag::Python, Arc::new(FixedScorer::new(0.1)));
    let analyzer = analyzer_with(sqlite_corpus(&temp), scorers);

    let result = analyzer.analyze("print('hi')", Some("a.py")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report::to_json(&result).unwrap()).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "language": "Python",
            "ai_percentage": 10.0,
            "plagiarism_percentage": 0.0,
            "is_plagiarized": false,
        })
    );
}

#[test]
fn test_capability_result_reaches_report() {
    let temp = TempDir::new().unwrap();
    let scorers = ScorerRegistry::new(Arc::new(FixedScorer::new(0.0)))
        .with(LanguageTag::Go, Arc::new(FixedScorer::new(1.0)));
    let analyzer = analyzer_with(sqlite_corpus(&temp), scorers);

    let result = analyzer.analyze("package main", Some("main.go")).unwrap();
    assert_eq!(result.language, LanguageTag::Go);
    assert_eq!(result.ai_percentage, 100.0);
    assert_eq!(result.scoring_degraded, None);
}

#[test]
fn test_unregistered_language_uses_default_scorer() {
    let temp = TempDir::new().unwrap();
    let scorers = ScorerRegistry::new(Arc::new(FixedScorer::new(0.25)))
        .with(LanguageTag::Python, Arc::new(FixedScorer::new(0.75)));
    let analyzer = analyzer_with(sqlite_corpus(&temp), scorers);

    let result = analyzer.analyze("puts 'hello'", Some("hello.rb")).unwrap();
    assert_eq!(result.language, LanguageTag::Ruby);
    assert_eq!(result.ai_percentage, 25.0);
    assert_eq!(result.plagiarism_percentage, 0.0);
    assert!(!result.is_plagiarized);
}

#[test]
fn test_slow_scorer_degrades_to_fallback() {
    let temp = TempDir::new().unwrap();
    let runner = ScoreRunner::new(Duration::from_millis(50), 0.3).unwrap();
    let analyzer = analyzer_with(
        sqlite_corpus(&temp),
        ScorerRegistry::new(Arc::new(SlowScorer)),
    )
    .runner(runner);

    let result = analyzer.analyze("int main() {}", Some("a.cpp")).unwrap();
    assert_eq!(result.language, LanguageTag::Cpp);
    assert_eq!(result.ai_percentage, 30.0);
    assert!(result.scoring_degraded.is_some());
}

#[test]
fn test_identical_resubmission_is_flagged() {
    let temp = TempDir::new().unwrap();
    let corpus = sqlite_corpus(&temp);
    let analyzer = analyzer_with(
        Arc::clone(&corpus),
        ScorerRegistry::new(Arc::new(FixedScorer::new(0.0))),
    );
    let code = "public class Main { public static void main(String[] args) {} }";

    let first = analyzer
        .run(&AnalysisRequest::new(code).filename(Some("Main.java")).commit(true))
        .unwrap();
    let first_id = match first.commit {
        CommitStatus::Committed(id) => id,
        other => panic!("expected commit, got {:?}", other),
    };
    assert!(!first.result.is_plagiarized);

    let second = analyzer
        .run(&AnalysisRequest::new(code).filename(Some("Main.java")))
        .unwrap();
    assert_eq!(second.result.plagiarism_percentage, 100.0);
    assert!(second.result.is_plagiarized);
    assert_eq!(second.result.best_match, Some(first_id));
    assert_eq!(corpus.count(LanguageTag::Java).unwrap(), 1);
}

#[test]
fn test_unrelated_submission_scores_zero() {
    let temp = TempDir::new().unwrap();
    let corpus = sqlite_corpus(&temp);
    corpus.append(LanguageTag::Python, "aaaa").unwrap();

    let analyzer = analyzer_with(corpus, ScorerRegistry::new(Arc::new(FixedScorer::new(0.0))));
    let result = analyzer.analyze("bbbb", Some("b.py")).unwrap();
    assert_eq!(result.plagiarism_percentage, 0.0);
    assert!(!result.is_plagiarized);
}

#[test]
fn test_corpus_persists_across_reopen() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        corpus: Some(temp.path().join("corpus.db")),
        ..Default::default()
    };

    {
        let store = corpus::open(config.backend, &config.corpus_path()).unwrap();
        let analyzer = Analyzer::from_config(&config, store).unwrap();
        let outcome = analyzer
            .run(&AnalysisRequest::new("<?php echo 1;").commit(true))
            .unwrap();
        assert_eq!(outcome.result.language, LanguageTag::Php);
        assert!(matches!(outcome.commit, CommitStatus::Committed(_)));
    }

    let store = corpus::open(config.backend, &config.corpus_path()).unwrap();
    assert_eq!(store.stats().unwrap(), vec![(LanguageTag::Php, 1)]);
}

#[test]
fn test_memory_backend_snapshot_is_shared_with_new_process() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("corpus.json");
    let code = "using System; class A { static void Main() { Console.WriteLine(1); } }";

    {
        let analyzer = analyzer_with(
            Arc::new(MemoryCorpus::with_snapshot(&snapshot).unwrap()),
            ScorerRegistry::new(Arc::new(FixedScorer::new(0.0))),
        );
        analyzer
            .run(&AnalysisRequest::new(code).filename(Some("a.cs")).commit(true))
            .unwrap();
    }

    let analyzer = analyzer_with(
        Arc::new(MemoryCorpus::with_snapshot(&snapshot).unwrap()),
        ScorerRegistry::new(Arc::new(FixedScorer::new(0.0))),
    );
    let result = analyzer.analyze(code, Some("b.cs")).unwrap();
    assert_eq!(result.language, LanguageTag::CSharp);
    assert!(result.is_plagiarized);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_from_async_context() {
    let scorers = ScorerRegistry::new(Arc::new(FixedScorer::new(0.0)))
        .with(LanguageTag::Python, Arc::new(FixedScorer::new(0.1)));
    let analyzer = analyzer_with(Arc::new(MemoryCorpus::new()), scorers);

    let outcome = analyzer
        .run(&AnalysisRequest::new("print(1)").filename(Some("a.py")).commit(true))
        .unwrap();
    assert_eq!(outcome.result.language, LanguageTag::Python);
    assert_eq!(outcome.result.ai_percentage, 10.0);
    assert_eq!(outcome.result.scoring_degraded, None);
    assert!(matches!(outcome.commit, CommitStatus::Committed(_)));
}

#[test]
fn test_classification_reason_is_public() {
    use copycheck::language::Detection;
    use copycheck::LanguageClassifier;

    let classifier = LanguageClassifier::builtin();
    assert_eq!(
        classifier.detect_with_reason("<?php echo 1;", None),
        (LanguageTag::Php, Detection::PhpOpenTag)
    );
    assert!(matches!(
        classifier.detect_with_reason("x", Some("lib.rs")),
        (LanguageTag::Rust, Detection::Extension)
    ));
}
