//! Inline suppression comments.
//!
//! # Invariants
//! - `// labstyle:allow(a, b)` covers its own line and the line below.
//! - `//! labstyle:allow-file(a)` covers the whole file.
//! - `*` names every rule.
//! - Findings without a line are only covered by file-wide suppressions.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static ALLOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//[/!]?\s*labstyle:allow\(([^)]*)\)").expect("valid allow comment regex")
});
static ALLOW_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//[/!]?\s*labstyle:allow-file\(([^)]*)\)")
        .expect("valid allow-file comment regex")
});

const ALL_RULES: &str = "*";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Suppressions {
    file_wide: BTreeSet<String>,
    /// 1-based comment line to the rule ids it names.
    by_line: BTreeMap<usize, BTreeSet<String>>,
}

impl Suppressions {
    pub fn parse(text: &str) -> Self {
        let mut suppressions = Self::default();
        for (index, line) in text.lines().enumerate() {
            for captures in ALLOW_FILE_RE.captures_iter(line) {
                suppressions.file_wide.extend(rule_list(&captures[1]));
            }
            for captures in ALLOW_RE.captures_iter(line) {
                suppressions
                    .by_line
                    .entry(index + 1)
                    .or_default()
                    .extend(rule_list(&captures[1]));
            }
        }
        suppressions
    }

    pub fn is_empty(&self) -> bool {
        self.file_wide.is_empty() && self.by_line.is_empty()
    }

    pub fn covers(&self, rule_id: &str, line: Option<usize>) -> bool {
        if names(&self.file_wide, rule_id) {
            return true;
        }
        let Some(line) = line else {
            return false;
        };
        [Some(line), line.checked_sub(1)]
            .into_iter()
            .flatten()
            .filter_map(|comment_line| self.by_line.get(&comment_line))
            .any(|rules| names(rules, rule_id))
    }
}

fn rule_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn names(rules: &BTreeSet<String>, rule_id: &str) -> bool {
    rules.contains(ALL_RULES) || rules.contains(rule_id)
}
