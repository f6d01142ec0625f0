//! `readme-doc`: library crates publish their README as crate docs.
//!
//! # Invariants
//! - Only crates with a `src/lib.rs` are checked.
//! - The README is resolved next to the crate manifest.

use crate::model::finding::{Location, Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::{CrateContext, Rule};
use once_cell::sync::Lazy;
use regex::Regex;

const LIB_ROOT: &str = "src/lib.rs";
const README_FILE_NAME: &str = "README.md";
const README_DIRECTIVE: &str = "#![doc = include_str!(\"../README.md\")]";

static README_DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"#!\[\s*doc\s*=\s*include_str!\s*\(\s*"\.\./README\.md"\s*\)\s*\]"#)
        .expect("valid readme directive regex")
});

pub struct ReadmeDocRule;

impl Rule for ReadmeDocRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "readme-doc",
            summary: "library crates include their README as crate documentation",
            scope: RuleScope::Crate,
            default_severity: Severity::Warning,
        }
    }

    fn check_crate(&self, ctx: &CrateContext<'_>) -> Vec<Violation> {
        let lib_path = ctx.krate.join(LIB_ROOT);
        let Some(lib) = ctx.files.iter().find(|file| file.path == lib_path) else {
            return Vec::new();
        };

        let mut violations = Vec::new();
        if !README_DIRECTIVE_RE.is_match(&lib.text) {
            violations.push(
                Violation::new(
                    Location::line(lib.path.clone(), 1),
                    format!("crate `{}` does not include its README as crate docs", ctx.krate.name),
                )
                .with_suggestion(README_DIRECTIVE),
            );
        }

        let readme_path = ctx.krate.join(README_FILE_NAME);
        if !ctx.root.join(&readme_path).is_file() {
            violations.push(Violation::new(
                Location::file(readme_path),
                format!("crate `{}` has no {README_FILE_NAME}", ctx.krate.name),
            ));
        }
        violations
    }
}
