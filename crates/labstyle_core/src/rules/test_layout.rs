//! `test-layout`: unit tests live in one trailing `#[cfg(test)] mod tests`.
//!
//! # Invariants
//! - Only `src/` files are checked; `tests/` files are integration tests.
//! - Whole-file test contexts (`tests.rs`, `#![cfg(test)]`) are exempt.

use crate::model::finding::{Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::{FileContext, Rule};
use crate::source::{has_cfg_test, is_test_fn, FileKind};
use syn::Item;

pub struct TestLayoutRule;

impl Rule for TestLayoutRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "test-layout",
            summary: "unit tests sit in a trailing `#[cfg(test)] mod tests`",
            scope: RuleScope::File,
            default_severity: Severity::Warning,
        }
    }

    fn check_file(&self, ctx: &FileContext<'_>) -> Vec<Violation> {
        if ctx.file.kind != FileKind::Library || ctx.file.is_test_context() {
            return Vec::new();
        }

        let mut violations = Vec::new();
        check_items(ctx, &ctx.syntax.items, &mut violations);

        if ctx.config.source.test_layout.require_last {
            let items = &ctx.syntax.items;
            let last_production = items.iter().rposition(|item| !is_test_module(item));
            for (index, item) in items.iter().enumerate() {
                let Item::Mod(module) = item else {
                    continue;
                };
                if is_test_module(item) && last_production.is_some_and(|last| index < last) {
                    violations.push(Violation::new(
                        ctx.file.location(module.ident.span()),
                        format!("test module `{}` must be the last item in the file", module.ident),
                    ));
                }
            }
        }

        violations
    }
}

fn check_items(ctx: &FileContext<'_>, items: &[Item], violations: &mut Vec<Violation>) {
    let expected_name = ctx.config.source.test_layout.module_name.as_str();
    for item in items {
        match item {
            Item::Fn(function) if is_test_fn(&function.attrs) => {
                violations.push(Violation::new(
                    ctx.file.location(function.sig.ident.span()),
                    format!(
                        "test function `{}` must live inside a `#[cfg(test)]` module",
                        function.sig.ident
                    ),
                ));
            }
            Item::Mod(module) if has_cfg_test(&module.attrs) => {
                if module.ident != expected_name {
                    violations.push(
                        Violation::new(
                            ctx.file.location(module.ident.span()),
                            format!(
                                "test module `{}` should be named `{expected_name}`",
                                module.ident
                            ),
                        )
                        .with_suggestion(format!("mod {expected_name}")),
                    );
                }
            }
            Item::Mod(module) => {
                if let Some((_, inner)) = &module.content {
                    check_items(ctx, inner, violations);
                }
            }
            _ => {}
        }
    }
}

fn is_test_module(item: &Item) -> bool {
    matches!(item, Item::Mod(module) if has_cfg_test(&module.attrs))
}

#[cfg(test)]
mod tests {
    use super::TestLayoutRule;
    use crate::config::LintConfig;
    use crate::rules::tests::{run_file_rule, run_file_rule_at};

    #[test]
    fn accepts_trailing_tests_module() {
        let violations = run_file_rule(
            &TestLayoutRule,
            &LintConfig::default(),
            "pub fn ping() {}\n#[cfg(test)]\nmod tests {\n    #[test]\n    fn ping_works() {}\n}\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn reports_stray_test_functions_and_misplaced_modules() {
        let violations = run_file_rule(
            &TestLayoutRule,
            &LintConfig::default(),
            "#[cfg(test)]\nmod checks {}\n\npub fn ping() {}\n\nmod inner {\n    #[test]\n    fn stray() {}\n}\n",
        );
        let messages = violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "test module `checks` should be named `tests`",
                "test function `stray` must live inside a `#[cfg(test)]` module",
                "test module `checks` must be the last item in the file",
            ]
        );
        assert_eq!(violations[1].location.line, Some(8));
    }

    #[test]
    fn combined_cfg_predicates_follow_the_test_flag() {
        let gated = run_file_rule(
            &TestLayoutRule,
            &LintConfig::default(),
            "pub fn ping() {}\n#[cfg(all(test, not(windows)))]\nmod tests {\n    #[test]\n    fn ping_works() {}\n}\n",
        );
        assert!(gated.is_empty());

        let feature_gated = run_file_rule(
            &TestLayoutRule,
            &LintConfig::default(),
            "#[cfg(feature = \"test-utils\")]\npub mod fixtures {}\n\npub fn ping() {}\n",
        );
        assert!(feature_gated.is_empty());

        let either = run_file_rule(
            &TestLayoutRule,
            &LintConfig::default(),
            "#[cfg(any(test, feature = \"bench\"))]\nmod helpers {}\n\npub fn ping() {}\n",
        );
        let messages = either
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "test module `helpers` should be named `tests`",
                "test module `helpers` must be the last item in the file",
            ]
        );
    }

    #[test]
    fn skips_test_context_files_and_can_allow_leading_modules() {
        let stray = "#[test]\nfn stray() {}\n";
        assert!(run_file_rule_at(&TestLayoutRule, &LintConfig::default(), "src/tests.rs", stray)
            .is_empty());

        let mut config = LintConfig::default();
        config.test_layout.require_last = false;
        let violations = run_file_rule(
            &TestLayoutRule,
            &config,
            "#[cfg(test)]\nmod tests {}\npub fn ping() {}\n",
        );
        assert!(violations.is_empty());
    }
}
