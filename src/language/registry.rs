//! Language profiles: the extension and keyword tables used for classification.

use phf::phf_map;

use super::LanguageTag;

/// Built-in extension table. Keys include the leading dot and are matched
/// case-sensitively.
static BUILTIN_EXTENSIONS: phf::Map<&'static str, LanguageTag> = phf_map! {
    ".py" => LanguageTag::Python,
    ".cpp" => LanguageTag::Cpp,
    ".cc" => LanguageTag::Cpp,
    ".hpp" => LanguageTag::Cpp,
    ".h" => LanguageTag::Cpp,
    ".cxx" => LanguageTag::Cpp,
    ".java" => LanguageTag::Java,
    ".js" => LanguageTag::JavaScript,
    ".mjs" => LanguageTag::JavaScript,
    ".cjs" => LanguageTag::JavaScript,
    ".cs" => LanguageTag::CSharp,
    ".php" => LanguageTag::Php,
    ".rb" => LanguageTag::Ruby,
    ".go" => LanguageTag::Go,
    ".swift" => LanguageTag::Swift,
    ".rs" => LanguageTag::Rust,
};

/// Characteristic markers for each built-in language.
fn builtin_keywords(tag: LanguageTag) -> &'static [&'static str] {
    match tag {
        LanguageTag::Python => &[
            "def", "import", "from", "class", "yield", "async", "await", "lambda",
        ],
        LanguageTag::Cpp => &[
            "#include", "std::", "namespace", "template", "cout", "cin", "::", "auto",
        ],
        LanguageTag::Java => &[
            "public", "static", "void", "class", "new", "import", "package", "System.out",
        ],
        LanguageTag::JavaScript => &[
            "function", "const", "let", "var", "=>", "console.log", "import", "export",
        ],
        LanguageTag::CSharp => &[
            "using", "namespace", "class", "public", "static", "void", "var",
            "Console.WriteLine",
        ],
        LanguageTag::Php => &["<?php", "echo", "function", "use", "namespace", "class"],
        LanguageTag::Ruby => &["def", "end", "class", "module", "require"],
        LanguageTag::Go => &[
            "package", "import", "func", "fmt.", "defer", "go ", "select", "chan",
        ],
        LanguageTag::Swift => &["import", "let", "var", "func", "class", "struct", "print("],
        LanguageTag::Rust => &[
            "fn ", "let ", "mut ", "use ", "pub ", "crate", "println!", "::",
        ],
    }
}

/// Extensions and keyword markers for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    pub tag: LanguageTag,
    /// File extensions including the leading dot (e.g. ".rs").
    pub extensions: Vec<String>,
    /// Substrings whose presence counts toward this language's score.
    pub keywords: Vec<String>,
}

impl LanguageProfile {
    /// The built-in profile for a language.
    pub fn builtin(tag: LanguageTag) -> Self {
        let mut extensions: Vec<String> = BUILTIN_EXTENSIONS
            .entries()
            .filter(|(_, t)| **t == tag)
            .map(|(ext, _)| ext.to_string())
            .collect();
        extensions.sort();

        Self {
            tag,
            extensions,
            keywords: builtin_keywords(tag).iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered collection of language profiles.
///
/// Registration order is significant: it breaks ties between languages with
/// equal keyword scores.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    profiles: Vec<LanguageProfile>,
}

impl LanguageRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in languages, in `LanguageTag::ALL` order.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for tag in LanguageTag::ALL {
            registry.register(LanguageProfile::builtin(tag));
        }
        registry
    }

    /// Add a profile. Re-registering a language replaces its profile in place,
    /// keeping its original position.
    pub fn register(&mut self, profile: LanguageProfile) {
        match self.profiles.iter_mut().find(|p| p.tag == profile.tag) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}
