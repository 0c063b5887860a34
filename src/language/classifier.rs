//! Extension-first language classifier with a keyword-scoring fallback.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::{LanguageRegistry, LanguageTag};

/// Opening marker that identifies PHP regardless of keyword scores.
const PHP_OPEN_TAG: &str = "<?php";

/// How a classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The filename extension matched a registered language.
    Extension,
    /// The code starts with the PHP opening tag.
    PhpOpenTag,
    /// Highest keyword score, with the number of markers found.
    Keywords(usize),
    /// No extension match and no keyword hits.
    Default,
}

/// Deterministic, total language classifier.
///
/// The tables are copied out of the registry at construction and never
/// change afterwards.
#[derive(Debug, Clone)]
pub struct LanguageClassifier {
    extensions: HashMap<String, LanguageTag>,
    /// (language, lower-cased markers) in registration order.
    keywords: Vec<(LanguageTag, Vec<String>)>,
    default: LanguageTag,
}

impl LanguageClassifier {
    /// Build a classifier from a registry and a fallback language.
    pub fn new(registry: &LanguageRegistry, default: LanguageTag) -> Self {
        let mut extensions = HashMap::new();
        let mut keywords = Vec::with_capacity(registry.len());

        for profile in registry.profiles() {
            for ext in &profile.extensions {
                // First registration wins if two languages claim an extension
                extensions.entry(ext.clone()).or_insert(profile.tag);
            }
            let markers = profile.keywords.iter().map(|k| k.to_lowercase()).collect();
            keywords.push((profile.tag, markers));
        }

        Self {
            extensions,
            keywords,
            default,
        }
    }

    /// Classifier over the built-in languages, defaulting to Python.
    pub fn builtin() -> Self {
        Self::new(&LanguageRegistry::builtin(), LanguageTag::Python)
    }

    pub fn default_language(&self) -> LanguageTag {
        self.default
    }

    /// Determine the language of `code`, optionally using its filename.
    pub fn detect(&self, code: &str, filename: Option<&str>) -> LanguageTag {
        let (tag, how) = self.detect_with_reason(code, filename);
        debug!(language = %tag, method = ?how, "classified submission");
        tag
    }

    /// Like [`detect`](Self::detect) but also reports which rule decided.
    pub fn detect_with_reason(
        &self,
        code: &str,
        filename: Option<&str>,
    ) -> (LanguageTag, Detection) {
        if let Some(tag) = filename.and_then(|name| self.by_extension(name)) {
            return (tag, Detection::Extension);
        }

        let code_lower = code.to_lowercase();
        if code_lower.trim().starts_with(PHP_OPEN_TAG) {
            return (LanguageTag::Php, Detection::PhpOpenTag);
        }

        let mut best: Option<(LanguageTag, usize)> = None;
        for (tag, markers) in &self.keywords {
            let score = markers
                .iter()
                .filter(|m| code_lower.contains(m.as_str()))
                .count();
            // Strictly greater keeps the earliest registration on ties
            if score > best.map(|(_, s)| s).unwrap_or(0) {
                best = Some((*tag, score));
            }
        }

        match best {
            Some((tag, score)) => (tag, Detection::Keywords(score)),
            None => (self.default, Detection::Default),
        }
    }

    /// Look up a filename's extension in the extension table.
    fn by_extension(&self, filename: &str) -> Option<LanguageTag> {
        let ext = Path::new(filename).extension()?.to_str()?;
        self.extensions.get(&format!(".{}", ext)).copied()
    }
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
