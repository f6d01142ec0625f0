//! Static rule descriptions.

use crate::model::finding::Severity;
use serde::Serialize;

/// Unit a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// Once per parsed Rust source file.
    File,
    /// Once per discovered crate.
    Crate,
    /// Once per checked root.
    Workspace,
}

impl RuleScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Crate => "crate",
            Self::Workspace => "workspace",
        }
    }
}

/// Declarative description of one convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    /// Stable kebab-case id, e.g. `field-order`.
    pub id: &'static str,
    pub summary: &'static str,
    pub scope: RuleScope,
    pub default_severity: Severity,
}

/// Reserved rule id for files the parser rejects.
pub const SYNTAX_RULE_ID: &str = "syntax";

/// Returns whether `value` is a kebab-case rule id.
pub fn is_valid_rule_id(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if c == '-' && !prev_separator {
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

#[cfg(test)]
mod tests {
    use super::is_valid_rule_id;

    #[test]
    fn accepts_kebab_case_ids() {
        assert!(is_valid_rule_id("field-order"));
        assert!(is_valid_rule_id("syntax"));
        assert!(is_valid_rule_id("rule2-x"));
    }

    #[test]
    fn rejects_malformed_ids() {
        for value in ["", "Field-order", "field--order", "field-", "-field", "field_order"] {
            assert!(!is_valid_rule_id(value), "{value} should be rejected");
        }
    }
}
