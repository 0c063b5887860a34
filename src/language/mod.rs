//! Language tags and source-language classification.
//!
//! A submission's language decides two things downstream: which corpus
//! partition it is compared against, and which scoring capability estimates
//! its machine-authorship likelihood.

mod classifier;
mod registry;

pub use classifier::{Detection, LanguageClassifier};
pub use registry::{LanguageProfile, LanguageRegistry};

use serde::{Deserialize, Serialize};

/// The supported source languages.
///
/// Variant order is the built-in registration order and is used as the
/// tie-break when keyword scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageTag {
    Python,
    #[serde(rename = "C++")]
    Cpp,
    Java,
    JavaScript,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "PHP")]
    Php,
    Ruby,
    Go,
    Swift,
    Rust,
}

impl LanguageTag {
    /// All built-in languages in registration order.
    pub const ALL: [LanguageTag; 10] = [
        LanguageTag::Python,
        LanguageTag::Cpp,
        LanguageTag::Java,
        LanguageTag::JavaScript,
        LanguageTag::CSharp,
        LanguageTag::Php,
        LanguageTag::Ruby,
        LanguageTag::Go,
        LanguageTag::Swift,
        LanguageTag::Rust,
    ];

    /// Display name, also the value persisted in the corpus.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Python => "Python",
            LanguageTag::Cpp => "C++",
            LanguageTag::Java => "Java",
            LanguageTag::JavaScript => "JavaScript",
            LanguageTag::CSharp => "C#",
            LanguageTag::Php => "PHP",
            LanguageTag::Ruby => "Ruby",
            LanguageTag::Go => "Go",
            LanguageTag::Swift => "Swift",
            LanguageTag::Rust => "Rust",
        }
    }

    /// Parse a display name or a common alias, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Some(LanguageTag::Python),
            "c++" | "cpp" | "cxx" => Some(LanguageTag::Cpp),
            "java" => Some(LanguageTag::Java),
            "javascript" | "js" => Some(LanguageTag::JavaScript),
            "c#" | "csharp" | "cs" => Some(LanguageTag::CSharp),
            "php" => Some(LanguageTag::Php),
            "ruby" | "rb" => Some(LanguageTag::Ruby),
            "go" | "golang" => Some(LanguageTag::Go),
            "swift" => Some(LanguageTag::Swift),
            "rust" | "rs" => Some(LanguageTag::Rust),
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTag::parse(s).ok_or_else(|| format!("unknown language: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_parse() {
        for tag in LanguageTag::ALL {
            assert_eq!(LanguageTag::parse(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(LanguageTag::parse("cpp"), Some(LanguageTag::Cpp));
        assert_eq!(LanguageTag::parse("CSHARP"), Some(LanguageTag::CSharp));
        assert_eq!(LanguageTag::parse(" golang "), Some(LanguageTag::Go));
        assert_eq!(LanguageTag::parse("cobol"), None);
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&LanguageTag::Cpp).unwrap();
        assert_eq!(json, "\"C++\"");
        let tag: LanguageTag = serde_json::from_str("\"C#\"").unwrap();
        assert_eq!(tag, LanguageTag::CSharp);
    }
}
