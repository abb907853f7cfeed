//! Error classification and remediation hints.
//!
//! [`AutoDebugger::analyze_error`] matches raw error text against a fixed
//! pattern table and never fails: unrecognized text yields no suggestions.
//! [`AutoDebugger::generate_fix_code`] only knows how to repair missing
//! semicolons and otherwise returns the code unchanged.

use serde::{Deserialize, Serialize};

/// Known error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    SyntaxError,
    TypeError,
    ModuleNotFound,
    ReferenceError,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::SyntaxError => "SyntaxError",
            ErrorCategory::TypeError => "TypeError",
            ErrorCategory::ModuleNotFound => "ModuleNotFound",
            ErrorCategory::ReferenceError => "ReferenceError",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggestion priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// One remediation hint for a classified error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugSuggestion {
    pub error_type: ErrorCategory,
    pub suggestion: String,
    pub priority: Priority,
}

struct ErrorPattern {
    category: ErrorCategory,
    markers: &'static [&'static str],
    suggestion: &'static str,
    priority: Priority,
}

const PATTERNS: &[ErrorPattern] = &[
    ErrorPattern {
        category: ErrorCategory::SyntaxError,
        markers: &["SyntaxError", "Unexpected token"],
        suggestion: "Check for missing brackets, parentheses, or semicolons",
        priority: Priority::High,
    },
    ErrorPattern {
        category: ErrorCategory::TypeError,
        markers: &["TypeError", "is not a function"],
        suggestion: "Verify variable types and that called values are functions",
        priority: Priority::High,
    },
    ErrorPattern {
        category: ErrorCategory::ModuleNotFound,
        markers: &["Cannot find module", "Module not found"],
        suggestion: "Install the missing dependency or fix the import path",
        priority: Priority::High,
    },
    ErrorPattern {
        category: ErrorCategory::ReferenceError,
        markers: &["ReferenceError", "is not defined"],
        suggestion: "Declare the variable before use or check for typos in its name",
        priority: Priority::High,
    },
];

/// Stateless error classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDebugger;

impl AutoDebugger {
    pub fn new() -> Self {
        Self
    }

    /// One suggestion per matching category, in table order.
    pub fn analyze_error(&self, error: &str) -> Vec<DebugSuggestion> {
        PATTERNS
            .iter()
            .filter(|p| p.markers.iter().any(|m| error.contains(m)))
            .map(|p| DebugSuggestion {
                error_type: p.category,
                suggestion: p.suggestion.to_string(),
                priority: p.priority,
            })
            .collect()
    }

    /// Best-effort repair for a "missing semicolon" error.
    ///
    /// Appends `;` to statement lines that lack a terminator. Any other
    /// error returns `code` unchanged.
    pub fn generate_fix_code(&self, code: &str, error: &str) -> String {
        if !error.to_ascii_lowercase().contains("missing semicolon") {
            return code.to_string();
        }

        let mut fixed: Vec<String> = code
            .lines()
            .map(|line| {
                if needs_semicolon(line) {
                    format!("{};", line.trim_end())
                } else {
                    line.to_string()
                }
            })
            .collect();
        if code.ends_with('\n') {
            fixed.push(String::new());
        }
        fixed.join("\n")
    }
}

fn needs_semicolon(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('*') {
        return false;
    }
    !trimmed.ends_with([';', '{', '}', '(', '[', ',', ':'])
        && !trimmed.ends_with("*/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_category() {
        let dbg = AutoDebugger::new();
        let cases = [
            ("SyntaxError: Unexpected token '}'", ErrorCategory::SyntaxError),
            ("TypeError: foo is not a function", ErrorCategory::TypeError),
            ("Error: Cannot find module 'express'", ErrorCategory::ModuleNotFound),
            ("ReferenceError: x is not defined", ErrorCategory::ReferenceError),
        ];
        for (text, expected) in cases {
            let suggestions = dbg.analyze_error(text);
            assert_eq!(suggestions.len(), 1, "{text}");
            assert_eq!(suggestions[0].error_type, expected);
            assert_eq!(suggestions[0].priority, Priority::High);
        }
    }

    #[test]
    fn test_secondary_markers_match() {
        let dbg = AutoDebugger::new();
        let s = dbg.analyze_error("Module not found: can't resolve './db'");
        assert_eq!(s[0].error_type, ErrorCategory::ModuleNotFound);
        let s = dbg.analyze_error("undefined is not a function");
        assert_eq!(s[0].error_type, ErrorCategory::TypeError);
    }

    #[test]
    fn test_multiple_categories_in_one_message() {
        let dbg = AutoDebugger::new();
        let s = dbg.analyze_error("TypeError after ReferenceError: y is not defined");
        let kinds: Vec<_> = s.iter().map(|s| s.error_type).collect();
        assert_eq!(
            kinds,
            vec![ErrorCategory::TypeError, ErrorCategory::ReferenceError]
        );
    }

    #[test]
    fn test_unknown_error_yields_nothing() {
        assert!(AutoDebugger::new()
            .analyze_error("disk quota exceeded")
            .is_empty());
        assert!(AutoDebugger::new().analyze_error("").is_empty());
    }

    #[test]
    fn test_fix_missing_semicolons() {
        let code = "const a = 1\nfunction f() {\n  return a\n}\n";
        let fixed = AutoDebugger::new().generate_fix_code(code, "Missing semicolon");
        assert_eq!(fixed, "const a = 1;\nfunction f() {\n  return a;\n}\n");
    }

    #[test]
    fn test_fix_leaves_comments_alone() {
        let code = "// note\nlet x = 2";
        let fixed = AutoDebugger::new().generate_fix_code(code, "missing semicolon at 2:9");
        assert_eq!(fixed, "// note\nlet x = 2;");
    }

    #[test]
    fn test_fix_other_errors_returns_input() {
        let code = "const a = 1\n";
        assert_eq!(
            AutoDebugger::new().generate_fix_code(code, "TypeError: nope"),
            code
        );
    }
}
