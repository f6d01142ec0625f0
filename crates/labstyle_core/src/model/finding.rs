//! Violations reported by rules and findings emitted by the engine.
//!
//! # Responsibility
//! - Carry location, message and optional reorder suggestion.
//! - Provide a line-independent fingerprint for baseline matching.
//!
//! # Invariants
//! - `line` and `column` are 1-based when present.
//! - `Severity` ordering is `Info < Warning < Error`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How strongly a finding should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a severity name as written in config files and CLI flags.
pub fn parse_severity(value: &str) -> Result<Severity, SeverityParseError> {
    match value.trim() {
        "info" => Ok(Severity::Info),
        "warning" | "warn" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        other => Err(SeverityParseError(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityParseError(pub String);

impl Display for SeverityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported severity `{}`; expected info|warning|error",
            self.0
        )
    }
}

impl Error for SeverityParseError {}

/// Position of a finding relative to the checked root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Root-relative path with `/` separators.
    pub path: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Location {
    /// Location covering a whole file.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(path: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn line(path: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
            column: None,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{line}:{column}", self.path),
            (Some(line), None) => write!(f, "{}:{line}", self.path),
            _ => f.write_str(&self.path),
        }
    }
}

/// One convention breach as seen by a rule, before severity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: Location,
    pub message: String,
    /// Suggested order or replacement. Never applied automatically.
    pub suggestion: Option<String>,
}

impl Violation {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Violation stamped with its rule id and effective severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn from_violation(rule_id: &str, severity: Severity, violation: Violation) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            location: violation.location,
            message: violation.message,
            suggestion: violation.suggestion,
        }
    }

    /// Line-independent identity used by the baseline store.
    pub fn fingerprint(&self) -> String {
        format!("{}|{}|{}", self.rule_id, self.location.path, self.message)
    }

    /// Deterministic report order: path, line, column, rule, message.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.location
            .path
            .cmp(&other.location.path)
            .then_with(|| self.location.line.cmp(&other.location.line))
            .then_with(|| self.location.column.cmp(&other.location.column))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.message.cmp(&other.message))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_severity, Finding, Location, Severity, Violation};
    use std::cmp::Ordering;

    #[test]
    fn severity_orders_from_info_to_error() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(parse_severity("warn").expect("warn"), Severity::Warning);
        assert!(parse_severity("fatal").is_err());
    }

    #[test]
    fn fingerprint_ignores_position() {
        let first = Finding::from_violation(
            "field-order",
            Severity::Warning,
            Violation::new(Location::at("src/lib.rs", 3, 1), "field `id` out of order"),
        );
        let mut moved = first.clone();
        moved.location = Location::at("src/lib.rs", 40, 5);

        assert_eq!(first.fingerprint(), moved.fingerprint());
        assert_eq!(first.report_order(&moved), Ordering::Less);
    }

    #[test]
    fn location_display_omits_missing_parts() {
        assert_eq!(Location::file("CHANGELOG.md").to_string(), "CHANGELOG.md");
        assert_eq!(Location::line("CHANGELOG.md", 4).to_string(), "CHANGELOG.md:4");
        assert_eq!(Location::at("src/a.rs", 2, 9).to_string(), "src/a.rs:2:9");
    }
}
