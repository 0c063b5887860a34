//! Fixed-weight linear heuristic scorers.
//!
//! Each scorer extracts a small vector of stylistic features from the code,
//! takes a weighted sum with a per-language weight table, and squashes it
//! through a logistic function. The weights are hand-set, not trained.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ScoringCapability, ScoringError};
use crate::language::{LanguageProfile, LanguageTag};

lazy_static! {
    static ref STRING_LITERAL: Regex =
        Regex::new(r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'"#).unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap();
    static ref TODO_MARKER: Regex = Regex::new(r"(?i)\b(TODO|FIXME|XXX)\b").unwrap();
    static ref BRANCH: Regex = Regex::new(
        r"\b(if|elif|else|for|foreach|while|switch|case|match|catch|except|rescue|guard|select)\b|&&|\|\|"
    )
    .unwrap();
    static ref IMPORT_LINE: Regex = Regex::new(
        r"^\s*(import\s|from\s+\S+\s+import\s|#include\b|use\s|using\s|require(_relative)?\b|package\s)"
    )
    .unwrap();
    static ref WORD: Regex = Regex::new(r"[A-Za-z]{2,}").unwrap();
}

/// Phrases that tend to show up in generated code and its comments.
const AI_MARKERS: &[&str] = &[
    "as an ai",
    "here is",
    "here's",
    "this function",
    "this code",
    "example usage",
    "step 1",
    "note:",
    "generated by",
    "helper function",
];

/// Feature vector extracted from one code text. Every field is in [0, 1].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub comment_ratio: f64,
    pub avg_line_length_scaled: f64,
    pub empty_line_ratio: f64,
    pub string_literal_ratio: f64,
    pub ai_marker_ratio: f64,
    pub docstring_present: f64,
    pub todo_ratio: f64,
    pub english_comment_density: f64,
    pub snake_case_ratio: f64,
    pub camel_case_ratio: f64,
    pub pascal_case_ratio: f64,
    pub identifier_avg_length_scaled: f64,
    pub complexity_ratio: f64,
    pub import_count_scaled: f64,
    pub keyword_presence_ratio: f64,
    pub indent_consistency: f64,
}

/// Weight per feature plus a bias term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureWeights {
    pub bias: f64,
    pub comment_ratio: f64,
    pub avg_line_length_scaled: f64,
    pub empty_line_ratio: f64,
    pub string_literal_ratio: f64,
    pub ai_marker_ratio: f64,
    pub docstring_present: f64,
    pub todo_ratio: f64,
    pub english_comment_density: f64,
    pub snake_case_ratio: f64,
    pub camel_case_ratio: f64,
    pub pascal_case_ratio: f64,
    pub identifier_avg_length_scaled: f64,
    pub complexity_ratio: f64,
    pub import_count_scaled: f64,
    pub keyword_presence_ratio: f64,
    pub indent_consistency: f64,
}

impl FeatureWeights {
    /// Hand-set weight table for a built-in language.
    ///
    /// All tables share the common shape below; languages override the
    /// naming-convention weights and a few others.
    pub fn builtin(tag: LanguageTag) -> Self {
        let base = FeatureWeights {
            bias: -0.2,
            comment_ratio: 0.4,
            avg_line_length_scaled: -0.1,
            empty_line_ratio: -0.15,
            string_literal_ratio: 0.1,
            ai_marker_ratio: 4.0,
            docstring_present: 0.0,
            todo_ratio: 0.2,
            english_comment_density: 0.5,
            snake_case_ratio: 0.0,
            camel_case_ratio: 0.0,
            pascal_case_ratio: 0.0,
            identifier_avg_length_scaled: -0.1,
            complexity_ratio: -0.1,
            import_count_scaled: 0.2,
            keyword_presence_ratio: 0.5,
            indent_consistency: 0.3,
        };

        match tag {
            LanguageTag::Python => FeatureWeights {
                docstring_present: 0.3,
                snake_case_ratio: 0.3,
                english_comment_density: 0.6,
                indent_consistency: 0.4,
                ..base
            },
            LanguageTag::Cpp => FeatureWeights {
                bias: -0.3,
                avg_line_length_scaled: -0.2,
                empty_line_ratio: -0.1,
                english_comment_density: 0.4,
                snake_case_ratio: 0.2,
                camel_case_ratio: 0.1,
                pascal_case_ratio: 0.1,
                import_count_scaled: 0.1,
                ..base
            },
            LanguageTag::Java => FeatureWeights {
                docstring_present: 0.2,
                camel_case_ratio: 0.3,
                pascal_case_ratio: 0.2,
                ..base
            },
            LanguageTag::JavaScript => FeatureWeights {
                camel_case_ratio: 0.3,
                pascal_case_ratio: 0.1,
                string_literal_ratio: 0.15,
                ..base
            },
            LanguageTag::CSharp => FeatureWeights {
                docstring_present: 0.1,
                camel_case_ratio: 0.2,
                pascal_case_ratio: 0.3,
                ..base
            },
            LanguageTag::Php => FeatureWeights {
                avg_line_length_scaled: -0.15,
                string_literal_ratio: 0.15,
                snake_case_ratio: 0.2,
                camel_case_ratio: 0.2,
                pascal_case_ratio: 0.1,
                ..base
            },
            LanguageTag::Ruby => FeatureWeights {
                bias: -0.15,
                comment_ratio: 0.5,
                string_literal_ratio: 0.15,
                english_comment_density: 0.6,
                snake_case_ratio: 0.3,
                ..base
            },
            LanguageTag::Go => FeatureWeights {
                camel_case_ratio: 0.3,
                pascal_case_ratio: 0.2,
                indent_consistency: 0.4,
                ..base
            },
            LanguageTag::Swift => FeatureWeights {
                camel_case_ratio: 0.2,
                pascal_case_ratio: 0.3,
                keyword_presence_ratio: 0.6,
                indent_consistency: 0.4,
                ..base
            },
            LanguageTag::Rust => FeatureWeights {
                docstring_present: 0.1,
                snake_case_ratio: 0.3,
                pascal_case_ratio: 0.1,
                indent_consistency: 0.4,
                ..base
            },
        }
    }

    /// Bias plus the weighted sum of `features`.
    pub fn linear(&self, f: &Features) -> f64 {
        self.bias
            + self.comment_ratio * f.comment_ratio
            + self.avg_line_length_scaled * f.avg_line_length_scaled
            + self.empty_line_ratio * f.empty_line_ratio
            + self.string_literal_ratio * f.string_literal_ratio
            + self.ai_marker_ratio * f.ai_marker_ratio
            + self.docstring_present * f.docstring_present
            + self.todo_ratio * f.todo_ratio
            + self.english_comment_density * f.english_comment_density
            + self.snake_case_ratio * f.snake_case_ratio
            + self.camel_case_ratio * f.camel_case_ratio
            + self.pascal_case_ratio * f.pascal_case_ratio
            + self.identifier_avg_length_scaled * f.identifier_avg_length_scaled
            + self.complexity_ratio * f.complexity_ratio
            + self.import_count_scaled * f.import_count_scaled
            + self.keyword_presence_ratio * f.keyword_presence_ratio
            + self.indent_consistency * f.indent_consistency
    }
}

/// Comment prefixes recognised at the start of a trimmed line.
fn comment_prefixes(tag: LanguageTag) -> &'static [&'static str] {
    match tag {
        LanguageTag::Python | LanguageTag::Ruby => &["#"],
        LanguageTag::Php => &["//", "#", "/*", "*"],
        _ => &["//", "/*", "*"],
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn scaled(value: f64, max: f64) -> f64 {
    (value / max).clamp(0.0, 1.0)
}

impl Features {
    /// Extract the feature vector of `code`, interpreted as `tag`.
    pub fn extract(code: &str, tag: LanguageTag, keywords: &[String]) -> Self {
        let lines: Vec<&str> = code.lines().collect();
        if lines.is_empty() {
            return Features::default();
        }
        let total = lines.len();
        let non_empty: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| !l.trim().is_empty())
            .collect();

        let prefixes = comment_prefixes(tag);
        let comments: Vec<&str> = non_empty
            .iter()
            .map(|l| l.trim())
            .filter(|l| prefixes.iter().any(|p| l.starts_with(p)))
            .collect();

        let english_comments = comments
            .iter()
            .filter(|c| WORD.find_iter(c).count() >= 3)
            .count();

        let code_lower = code.to_lowercase();
        let marker_lines = code_lower
            .lines()
            .filter(|l| AI_MARKERS.iter().any(|m| l.contains(m)))
            .count();

        let string_chars: usize = STRING_LITERAL.find_iter(code).map(|m| m.as_str().len()).sum();

        let identifiers: Vec<&str> = IDENTIFIER
            .find_iter(code)
            .map(|m| m.as_str())
            .filter(|id| id.len() > 1)
            .collect();
        let snake = identifiers
            .iter()
            .filter(|id| id.contains('_') && !id.chars().any(|c| c.is_ascii_uppercase()))
            .count();
        let camel = identifiers
            .iter()
            .filter(|id| {
                id.starts_with(|c: char| c.is_ascii_lowercase())
                    && id.chars().any(|c| c.is_ascii_uppercase())
                    && !id.contains('_')
            })
            .count();
        let pascal = identifiers
            .iter()
            .filter(|id| {
                id.starts_with(|c: char| c.is_ascii_uppercase())
                    && id.chars().any(|c| c.is_ascii_lowercase())
                    && !id.contains('_')
            })
            .count();
        let ident_len: usize = identifiers.iter().map(|id| id.len()).sum();

        let branch_lines = non_empty.iter().filter(|l| BRANCH.is_match(l)).count();
        let import_lines = non_empty.iter().filter(|l| IMPORT_LINE.is_match(l)).count();
        let todo_lines = non_empty.iter().filter(|l| TODO_MARKER.is_match(l)).count();

        let keyword_hits = keywords
            .iter()
            .filter(|k| code_lower.contains(&k.to_lowercase()))
            .count();

        let avg_line_len = ratio(
            non_empty.iter().map(|l| l.trim_end().chars().count()).sum(),
            non_empty.len(),
        );

        Features {
            comment_ratio: ratio(comments.len(), total),
            avg_line_length_scaled: scaled(avg_line_len, 100.0),
            empty_line_ratio: ratio(total - non_empty.len(), total),
            string_literal_ratio: ratio(string_chars, code.len()).min(1.0),
            ai_marker_ratio: ratio(marker_lines, total),
            docstring_present: if code.contains("\"\"\"")
                || code.contains("'''")
                || code.contains("/**")
                || code.contains("///")
            {
                1.0
            } else {
                0.0
            },
            todo_ratio: ratio(todo_lines, total),
            english_comment_density: ratio(english_comments, comments.len()),
            snake_case_ratio: ratio(snake, identifiers.len()),
            camel_case_ratio: ratio(camel, identifiers.len()),
            pascal_case_ratio: ratio(pascal, identifiers.len()),
            identifier_avg_length_scaled: scaled(ratio(ident_len, identifiers.len()), 20.0),
            complexity_ratio: ratio(branch_lines, non_empty.len()),
            import_count_scaled: scaled(import_lines as f64, 10.0),
            keyword_presence_ratio: ratio(keyword_hits, keywords.len()),
            indent_consistency: indent_consistency(&non_empty),
        }
    }
}

/// Fraction of indented lines whose indentation is a whole number of units.
///
/// The unit is a tab when tabs dominate, otherwise the smallest space indent
/// seen. Code with no indented lines is fully consistent.
fn indent_consistency(lines: &[&str]) -> f64 {
    let indents: Vec<&str> = lines
        .iter()
        .map(|l| &l[..l.len() - l.trim_start().len()])
        .filter(|i| !i.is_empty())
        .collect();
    if indents.is_empty() {
        return 1.0;
    }

    let tabbed = indents.iter().filter(|i| i.chars().all(|c| c == '\t')).count();
    if tabbed * 2 > indents.len() {
        return ratio(tabbed, indents.len());
    }

    let unit = indents
        .iter()
        .filter(|i| i.chars().all(|c| c == ' '))
        .map(|i| i.len())
        .min()
        .unwrap_or(4);
    let consistent = indents
        .iter()
        .filter(|i| i.chars().all(|c| c == ' ') && i.len() % unit == 0)
        .count();
    ratio(consistent, indents.len())
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic model over [`Features`] with a fixed [`FeatureWeights`] table.
#[derive(Debug, Clone)]
pub struct LinearHeuristicScorer {
    name: String,
    language: LanguageTag,
    weights: FeatureWeights,
    keywords: Vec<String>,
}

impl LinearHeuristicScorer {
    pub fn new(language: LanguageTag, weights: FeatureWeights) -> Self {
        Self {
            name: format!("heuristic:{}", language),
            language,
            weights,
            keywords: LanguageProfile::builtin(language).keywords,
        }
    }

    /// Scorer with the built-in weight table for `language`.
    pub fn builtin(language: LanguageTag) -> Self {
        Self::new(language, FeatureWeights::builtin(language))
    }

    pub fn language(&self) -> LanguageTag {
        self.language
    }

    pub fn features(&self, code: &str) -> Features {
        Features::extract(code, self.language, &self.keywords)
    }
}

impl ScoringCapability for LinearHeuristicScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, code: &str) -> Result<f64, ScoringError> {
        let features = self.features(code);
        Ok(sigmoid(self.weights.linear(&features)))
    }
}
