//! Machine-authorship scoring capabilities.
//!
//! A capability maps code text to a likelihood in [0, 1]. The core never
//! depends on a concrete implementation: capabilities are looked up per
//! language in a [`ScorerRegistry`] built at startup, with a default used for
//! languages that have no entry.
//!
//! Calls go through [`ScoreRunner`], which bounds each call with a timeout and
//! turns failures into a configured fallback value instead of an error.

mod heuristic;

pub use heuristic::{FeatureWeights, Features, LinearHeuristicScorer};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::language::LanguageTag;

/// Default time allowed for a single capability call.
pub const DEFAULT_SCORING_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors a capability call can end with.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("scorer failed: {0}")]
    Failed(String),
    #[error("scorer timed out after {0:?}")]
    TimedOut(Duration),
    #[error("scorer panicked")]
    Panicked,
    #[error("scorer returned a non-finite value")]
    NonFinite,
}

/// A pluggable estimator of machine-authorship likelihood.
///
/// Implementations hold only immutable configuration and may be called from
/// any thread.
pub trait ScoringCapability: Send + Sync {
    /// Short name used in logs (e.g. "heuristic:Rust").
    fn name(&self) -> &str;

    /// Likelihood in [0, 1] that `code` was machine-written.
    fn score(&self, code: &str) -> Result<f64, ScoringError>;
}

/// Always returns the same value.
#[derive(Debug, Clone)]
pub struct FixedScorer {
    name: String,
    value: f64,
}

impl FixedScorer {
    pub fn new(value: f64) -> Self {
        Self {
            name: format!("fixed:{}", value),
            value,
        }
    }
}

impl ScoringCapability for FixedScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, _code: &str) -> Result<f64, ScoringError> {
        Ok(self.value)
    }
}

/// Language-to-capability mapping with a mandatory default.
#[derive(Clone)]
pub struct ScorerRegistry {
    scorers: HashMap<LanguageTag, Arc<dyn ScoringCapability>>,
    default: Arc<dyn ScoringCapability>,
}

impl ScorerRegistry {
    /// A registry with no per-language entries.
    pub fn new(default: Arc<dyn ScoringCapability>) -> Self {
        Self {
            scorers: HashMap::new(),
            default,
        }
    }

    /// One heuristic scorer per built-in language; Python's doubles as the
    /// default.
    pub fn builtin() -> Self {
        let default: Arc<dyn ScoringCapability> =
            Arc::new(LinearHeuristicScorer::builtin(LanguageTag::Python));
        let mut registry = Self::new(Arc::clone(&default));
        for tag in LanguageTag::ALL {
            let scorer: Arc<dyn ScoringCapability> = if tag == LanguageTag::Python {
                Arc::clone(&default)
            } else {
                Arc::new(LinearHeuristicScorer::builtin(tag))
            };
            registry.scorers.insert(tag, scorer);
        }
        registry
    }

    /// Register (or replace) the capability for `language`.
    pub fn with(mut self, language: LanguageTag, scorer: Arc<dyn ScoringCapability>) -> Self {
        self.scorers.insert(language, scorer);
        self
    }

    /// Remove the capability for `language`, so it uses the default.
    pub fn without(mut self, language: LanguageTag) -> Self {
        self.scorers.remove(&language);
        self
    }

    /// Whether `language` has its own capability.
    pub fn contains(&self, language: LanguageTag) -> bool {
        self.scorers.contains_key(&language)
    }

    /// The capability for `language`, or the default.
    pub fn get(&self, language: LanguageTag) -> Arc<dyn ScoringCapability> {
        match self.scorers.get(&language) {
            Some(scorer) => Arc::clone(scorer),
            None => {
                debug!(%language, "no scorer registered, using default");
                Arc::clone(&self.default)
            }
        }
    }
}

/// Result of one guarded capability call.
#[derive(Debug, Clone, PartialEq)]
pub struct Likelihood {
    /// Value in [0, 1].
    pub value: f64,
    /// Why the fallback was used, if it was.
    pub degraded: Option<String>,
}

/// Runs capability calls on a blocking worker with a timeout.
pub struct ScoreRunner {
    runtime: Option<tokio::runtime::Runtime>,
    timeout: Duration,
    fallback: f64,
}

impl ScoreRunner {
    /// Create a runner. `fallback` is clamped to [0, 1].
    pub fn new(timeout: Duration, fallback: f64) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()?;
        Ok(Self {
            runtime: Some(runtime),
            timeout,
            fallback: clamp_unit(fallback),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Score `code`, degrading to the fallback on error, panic, timeout or a
    /// non-finite result. Finite results are clamped to [0, 1].
    pub fn run(&self, scorer: Arc<dyn ScoringCapability>, code: &str) -> Likelihood {
        let name = scorer.name().to_string();
        match self.call(scorer, code) {
            Ok(value) => {
                debug!(scorer = %name, value, "scored submission");
                Likelihood {
                    value: clamp_unit(value),
                    degraded: None,
                }
            }
            Err(e) => {
                warn!(scorer = %name, error = %e, fallback = self.fallback, "scoring degraded");
                Likelihood {
                    value: self.fallback,
                    degraded: Some(e.to_string()),
                }
            }
        }
    }

    fn call(&self, scorer: Arc<dyn ScoringCapability>, code: &str) -> Result<f64, ScoringError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| ScoringError::Failed("runtime shut down".to_string()))?;

        let code = code.to_string();
        let timeout = self.timeout;
        let scored = async move {
            let task = tokio::task::spawn_blocking(move || scorer.score(&code));
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(ScoringError::Panicked),
                Err(_) => Err(ScoringError::TimedOut(timeout)),
            }
        };

        // block_on panics on a thread that is already driving a runtime, so
        // callers inside async code get a dedicated thread for the call.
        let value = if tokio::runtime::Handle::try_current().is_ok() {
            std::thread::scope(|s| {
                s.spawn(|| runtime.block_on(scored))
                    .join()
                    .unwrap_or(Err(ScoringError::Panicked))
            })?
        } else {
            runtime.block_on(scored)?
        };

        if !value.is_finite() {
            return Err(ScoringError::NonFinite);
        }
        Ok(value)
    }
}

impl Drop for ScoreRunner {
    fn drop(&mut self) {
        // Abandoned (timed-out) scorer threads must not block shutdown.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Convert a likelihood to a percentage rounded to two decimals.
pub fn to_percentage(likelihood: f64) -> f64 {
    round2(clamp_unit(likelihood) * 100.0)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingScorer;

    impl ScoringCapability for FailingScorer {
        fn name(&self) -> &str {
            "failing"
        }

        fn score(&self, _code: &str) -> Result<f64, ScoringError> {
            Err(ScoringError::Failed("model unavailable".to_string()))
        }
    }

    struct PanickingScorer;

    impl ScoringCapability for PanickingScorer {
        fn name(&self) -> &str {
            "panicking"
        }

        fn score(&self, _code: &str) -> Result<f64, ScoringError> {
            panic!("boom")
        }
    }

    struct SlowScorer(Duration);

    impl ScoringCapability for SlowScorer {
        fn name(&self) -> &str {
            "slow"
        }

        fn score(&self, _code: &str) -> Result<f64, ScoringError> {
            std::thread::sleep(self.0);
            Ok(0.9)
        }
    }

    fn runner() -> ScoreRunner {
        ScoreRunner::new(Duration::from_secs(5), 0.25).unwrap()
    }

    #[test]
    fn test_registry_falls_back_to_default() {
        let registry = ScorerRegistry::new(Arc::new(FixedScorer::new(0.3)))
            .with(LanguageTag::Rust, Arc::new(FixedScorer::new(1.0)));

        assert!(registry.contains(LanguageTag::Rust));
        assert!(!registry.contains(LanguageTag::Go));
        assert_eq!(registry.get(LanguageTag::Rust).score("").unwrap(), 1.0);
        assert_eq!(registry.get(LanguageTag::Go).score("").unwrap(), 0.3);
    }

    #[test]
    fn test_builtin_registry_covers_all_languages() {
        let registry = ScorerRegistry::builtin();
        for tag in LanguageTag::ALL {
            assert!(registry.contains(tag), "missing scorer for {}", tag);
        }
        let registry = registry.without(LanguageTag::Swift);
        assert!(!registry.contains(LanguageTag::Swift));
        assert_eq!(registry.get(LanguageTag::Swift).name(), "heuristic:Python");
    }

    #[test]
    fn test_runner_passes_through_and_clamps() {
        let runner = runner();
        assert_eq!(runner.run(Arc::new(FixedScorer::new(0.4)), "x").value, 0.4);
        assert_eq!(runner.run(Arc::new(FixedScorer::new(7.0)), "x").value, 1.0);
        assert_eq!(runner.run(Arc::new(FixedScorer::new(-2.0)), "x").value, 0.0);
    }

    #[test]
    fn test_runner_degrades_on_failure() {
        let runner = runner();
        let result = runner.run(Arc::new(FailingScorer), "x");
        assert_eq!(result.value, 0.25);
        assert!(result.degraded.unwrap().contains("model unavailable"));

        let result = runner.run(Arc::new(FixedScorer::new(f64::NAN)), "x");
        assert_eq!(result.value, 0.25);
    }

    #[test]
    fn test_runner_degrades_on_panic() {
        let result = runner().run(Arc::new(PanickingScorer), "x");
        assert_eq!(result.value, 0.25);
        assert_eq!(result.degraded.as_deref(), Some("scorer panicked"));
    }

    #[test]
    fn test_runner_degrades_on_timeout() {
        let runner = ScoreRunner::new(Duration::from_millis(20), 0.0).unwrap();
        let result = runner.run(Arc::new(SlowScorer(Duration::from_millis(500))), "x");
        assert_eq!(result.value, 0.0);
        assert!(result.degraded.unwrap().contains("timed out"));
    }

    #[test]
    fn test_runner_clamps_fallback() {
        let runner = ScoreRunner::new(Duration::from_millis(750), 4.0).unwrap();
        assert_eq!(runner.timeout(), Duration::from_millis(750));
        assert_eq!(runner.fallback(), 1.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_runner_inside_multi_thread_runtime() {
        let runner = runner();
        assert_eq!(runner.run(Arc::new(FixedScorer::new(0.4)), "x").value, 0.4);
        assert_eq!(runner.run(Arc::new(FailingScorer), "x").value, 0.25);
    }

    #[tokio::test]
    async fn test_runner_inside_current_thread_runtime() {
        let result = runner().run(Arc::new(FixedScorer::new(0.6)), "x");
        assert_eq!(result.value, 0.6);
        assert_eq!(result.degraded, None);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(to_percentage(1.0), 100.0);
        assert_eq!(to_percentage(0.1), 10.0);
        assert_eq!(to_percentage(0.123456), 12.35);
        assert_eq!(to_percentage(3.0), 100.0);
        assert_eq!(round2(66.666), 66.67);
    }
}
