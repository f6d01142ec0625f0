//! `required-snippet`: configured boilerplate is present in matching files.
//!
//! The default requirement is the logging bootstrap call in binary entry
//! points (`src/main.rs` must call `init_logging(`).

use crate::model::finding::{Location, Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::{CrateContext, Rule};

pub struct RequiredSnippetRule;

impl Rule for RequiredSnippetRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "required-snippet",
            summary: "required boilerplate (e.g. logging init) is present",
            scope: RuleScope::Crate,
            default_severity: Severity::Error,
        }
    }

    fn check_crate(&self, ctx: &CrateContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();
        for file in &ctx.files {
            let crate_relative = ctx.krate.crate_relative(&file.path);
            for snippet in &ctx.config.snippets {
                if !snippet.files.is_match(crate_relative) || snippet.pattern.is_match(&file.text) {
                    continue;
                }
                violations.push(Violation::new(
                    Location::file(file.path.clone()),
                    format!("missing required snippet `{}`: {}", snippet.id, snippet.message),
                ));
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::RequiredSnippetRule;
    use crate::config::{CompiledConfig, LintConfig, SnippetRequirement};
    use crate::engine::discover::CrateLayout;
    use crate::model::finding::Violation;
    use crate::rules::{CrateContext, Rule};
    use crate::source::{FileKind, SourceFile};
    use std::path::Path;

    fn run(config: &LintConfig, files: &[(&str, &str)]) -> Vec<Violation> {
        let compiled = CompiledConfig::compile(config).expect("config");
        let sources = files
            .iter()
            .map(|(path, text)| SourceFile::parse(*path, FileKind::Library, *text))
            .collect::<Vec<_>>();
        let krate = CrateLayout {
            name: "cli".to_string(),
            dir: "crates/cli".to_string(),
            version: None,
            files: sources.iter().map(|file| file.path.clone()).collect(),
        };
        RequiredSnippetRule.check_crate(&CrateContext {
            root: Path::new("/unused"),
            krate: &krate,
            files: sources.iter().collect(),
            changelog: None,
            config: &compiled,
        })
    }

    #[test]
    fn requires_logging_init_in_main() {
        let violations = run(
            &LintConfig::default(),
            &[
                ("crates/cli/src/main.rs", "fn main() { run(); }"),
                ("crates/cli/src/lib.rs", "pub fn run() {}"),
            ],
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.path, "crates/cli/src/main.rs");
        assert!(violations[0].message.starts_with("missing required snippet `logging-init`"));

        let clean = run(
            &LintConfig::default(),
            &[(
                "crates/cli/src/main.rs",
                "fn main() { init_logging(\"info\", dir).ok(); }",
            )],
        );
        assert!(clean.is_empty());
    }

    #[test]
    fn supports_custom_requirements() {
        let mut config = LintConfig::default();
        config.required_snippets = vec![SnippetRequirement {
            id: "forbid-unsafe".to_string(),
            files: "src/lib.rs".to_string(),
            pattern: r"#!\[forbid\(unsafe_code\)\]".to_string(),
            message: "library roots forbid unsafe code".to_string(),
        }];
        let violations = run(
            &config,
            &[
                ("crates/cli/src/lib.rs", "pub fn run() {}"),
                ("crates/cli/src/main.rs", "fn main() {}"),
            ],
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.path, "crates/cli/src/lib.rs");
    }
}
