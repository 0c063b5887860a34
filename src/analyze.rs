//! Analysis orchestrator.
//!
//! Sequences one request: classify the language, read that language's corpus
//! partition, score plagiarism, score machine authorship, and (only when asked)
//! commit the submission afterwards. The commit always happens after the
//! corpus read, so a submission is never compared against itself.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::corpus::{CorpusError, CorpusStore, SubmissionId};
use crate::language::{LanguageClassifier, LanguageRegistry, LanguageTag};
use crate::plagiarism::PlagiarismDetector;
use crate::scoring::{self, ScoreRunner, ScorerRegistry, DEFAULT_SCORING_TIMEOUT};
use crate::similarity::SimilarityEngine;

/// One analysis request.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub code: &'a str,
    /// Original filename, used for extension-based classification.
    pub filename: Option<&'a str>,
    /// Append the submission to the corpus after analysis.
    pub commit: bool,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(code: &'a str) -> Self {
        Self {
            code,
            filename: None,
            commit: false,
        }
    }

    pub fn filename(mut self, filename: Option<&'a str>) -> Self {
        self.filename = filename;
        self
    }

    pub fn commit(mut self, commit: bool) -> Self {
        self.commit = commit;
        self
    }
}

/// The assembled report for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub language: LanguageTag,
    /// Machine-authorship likelihood, 0-100, two decimals.
    pub ai_percentage: f64,
    /// Best corpus match, 0-100, two decimals.
    pub plagiarism_percentage: f64,
    pub is_plagiarized: bool,
    /// Most similar previous submission, if the corpus was non-empty.
    pub best_match: Option<SubmissionId>,
    /// Set when the scorer failed and the fallback likelihood was used.
    pub scoring_degraded: Option<String>,
}

/// Whether and how the submission was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    NotRequested,
    Committed(SubmissionId),
    /// The append failed; the analysis itself is still valid.
    Failed(String),
}

/// Analysis result plus the separate commit outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub commit: CommitStatus,
}

/// Runs analysis requests against a corpus.
pub struct Analyzer {
    classifier: LanguageClassifier,
    corpus: Arc<dyn CorpusStore>,
    detector: PlagiarismDetector,
    scorers: ScorerRegistry,
    runner: ScoreRunner,
}

impl Analyzer {
    /// Create an analyzer with built-in languages, scorers and default policy.
    pub fn new(corpus: Arc<dyn CorpusStore>) -> std::io::Result<Self> {
        Ok(Self {
            classifier: LanguageClassifier::builtin(),
            corpus,
            detector: PlagiarismDetector::default(),
            scorers: ScorerRegistry::builtin(),
            runner: ScoreRunner::new(DEFAULT_SCORING_TIMEOUT, 0.0)?,
        })
    }

    /// Create an analyzer whose policy comes from `config`.
    pub fn from_config(config: &Config, corpus: Arc<dyn CorpusStore>) -> anyhow::Result<Self> {
        let classifier =
            LanguageClassifier::new(&LanguageRegistry::builtin(), config.default_language()?);
        let engine = SimilarityEngine::new(config.jaccard_weight, config.edit_distance_cap);
        let runner = ScoreRunner::new(config.scoring_timeout(), config.default_ai_likelihood)?;

        Ok(Self {
            classifier,
            corpus,
            detector: PlagiarismDetector::new(engine, config.plagiarism_threshold),
            scorers: ScorerRegistry::builtin(),
            runner,
        })
    }

    pub fn classifier(mut self, classifier: LanguageClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn detector(mut self, detector: PlagiarismDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn scorers(mut self, scorers: ScorerRegistry) -> Self {
        self.scorers = scorers;
        self
    }

    pub fn runner(mut self, runner: ScoreRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn corpus(&self) -> &Arc<dyn CorpusStore> {
        &self.corpus
    }

    /// Analyze without touching the corpus.
    pub fn analyze(
        &self,
        code: &str,
        filename: Option<&str>,
    ) -> Result<AnalysisResult, CorpusError> {
        let language = self.classifier.detect(code, filename);

        let previous = self.corpus.query(language)?;
        let plagiarism = self.detector.check(code, &previous);

        let likelihood = self.runner.run(self.scorers.get(language), code);

        let result = AnalysisResult {
            language,
            ai_percentage: scoring::to_percentage(likelihood.value),
            plagiarism_percentage: scoring::round2(plagiarism.percentage),
            is_plagiarized: plagiarism.is_plagiarized,
            best_match: plagiarism.best_match,
            scoring_degraded: likelihood.degraded,
        };
        info!(
            language = %result.language,
            corpus_size = previous.len(),
            ai_percentage = result.ai_percentage,
            plagiarism_percentage = result.plagiarism_percentage,
            is_plagiarized = result.is_plagiarized,
            "analysis complete"
        );
        Ok(result)
    }

    /// Analyze, then commit if the request asks for it.
    ///
    /// A failed commit is reported in [`AnalysisOutcome::commit`]; it never
    /// discards the analysis result.
    pub fn run(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisOutcome, CorpusError> {
        let result = self.analyze(request.code, request.filename)?;

        let commit = if request.commit {
            match self.corpus.append(result.language, request.code) {
                Ok(id) => {
                    info!(%id, language = %result.language, "submission committed");
                    CommitStatus::Committed(id)
                }
                Err(e) => {
                    warn!(error = %e, "failed to commit submission");
                    CommitStatus::Failed(e.to_string())
                }
            }
        } else {
            CommitStatus::NotRequested
        };

        Ok(AnalysisOutcome { result, commit })
    }
}
