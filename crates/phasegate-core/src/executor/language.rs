//! Source languages and the structural heuristics used to accept code.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Language tag attached to submitted code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Rust,
    Go,
    /// Anything else; checked against every known construct.
    Other(String),
}

impl Language {
    /// Parse a free-form language tag (`"js"`, `"TypeScript"`, `"py"`...).
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "jsx" | "node" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "python" | "py" => Language::Python,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            other => Language::Other(other.to_string()),
        }
    }

    /// Whether `code` contains a function- or class-like construct for this language.
    pub fn has_executable_construct(&self, code: &str) -> bool {
        let p = patterns();
        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(code));
        match self {
            Language::JavaScript | Language::TypeScript => matches(&p.js),
            Language::Python => matches(&p.python),
            Language::Rust => matches(&p.rust),
            Language::Go => matches(&p.go),
            Language::Other(_) => {
                matches(&p.js) || matches(&p.python) || matches(&p.rust) || matches(&p.go)
            }
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::JavaScript => f.write_str("javascript"),
            Language::TypeScript => f.write_str("typescript"),
            Language::Python => f.write_str("python"),
            Language::Rust => f.write_str("rust"),
            Language::Go => f.write_str("go"),
            Language::Other(tag) => f.write_str(tag),
        }
    }
}

struct ConstructPatterns {
    js: Option<Regex>,
    python: Option<Regex>,
    rust: Option<Regex>,
    go: Option<Regex>,
}

fn patterns() -> &'static ConstructPatterns {
    static PATTERNS: OnceLock<ConstructPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ConstructPatterns {
        js: Regex::new(r"\bfunction\b|\bclass\s+\w|=>|\bexport\s+(default\s+)?\w").ok(),
        python: Regex::new(r"(?m)^\s*(async\s+)?def\s+\w+\s*\(|^\s*class\s+\w").ok(),
        rust: Regex::new(r"\bfn\s+\w+|\bstruct\s+\w|\bimpl\b|\benum\s+\w").ok(),
        go: Regex::new(r"\bfunc\b|\btype\s+\w+\s+struct\b").ok(),
    })
}
