//! `param-order`: parameters run context, inputs, options, callbacks.
//!
//! The receiver is fixed by the language and never classified.

use crate::model::finding::{Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::ordering::{check_order, OrderedItem};
use crate::rules::walk::signatures;
use crate::rules::{FileContext, Rule};
use crate::source::type_text;
use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{FnArg, Pat};

pub struct ParamOrderRule;

impl Rule for ParamOrderRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "param-order",
            summary: "function parameters are ordered context, inputs, options, callbacks",
            scope: RuleScope::File,
            default_severity: Severity::Warning,
        }
    }

    fn check_file(&self, ctx: &FileContext<'_>) -> Vec<Violation> {
        signatures(&ctx.syntax.items)
            .into_iter()
            .filter_map(|signature| {
                let ordered = signature
                    .inputs
                    .iter()
                    .filter_map(|input| match input {
                        FnArg::Receiver(_) => None,
                        FnArg::Typed(typed) => Some(OrderedItem {
                            name: pattern_name(&typed.pat),
                            type_text: type_text(&typed.ty),
                            location: ctx.file.location(typed.pat.span()),
                        }),
                    })
                    .collect::<Vec<_>>();
                let subject = format!("fn `{}`", signature.ident);
                check_order(&ctx.config.param_groups, &ordered, "parameter", &subject)
            })
            .collect()
    }
}

fn pattern_name(pat: &Pat) -> String {
    match pat {
        Pat::Ident(binding) => binding.ident.to_string(),
        other => other
            .to_token_stream()
            .to_string()
            .split_whitespace()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::ParamOrderRule;
    use crate::config::LintConfig;
    use crate::rules::tests::run_file_rule;

    #[test]
    fn accepts_conventional_signatures() {
        let violations = run_file_rule(
            &ParamOrderRule,
            &LintConfig::default(),
            "fn open(conn: &Connection, id: RecordId, options: &Options, on_done: impl FnOnce()) {}
             impl Repo { fn get(&self, tx: &Transaction, id: u64) {} }",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn reports_context_after_inputs_in_methods_and_traits() {
        let violations = run_file_rule(
            &ParamOrderRule,
            &LintConfig::default(),
            "impl Repo { fn get(&self, id: u64, conn: &Connection) {} }
             trait Store { fn put(&self, value: &str, callback: &dyn Fn(u32), settings: Settings); }",
        );
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0].message,
            "parameter `conn` (context) should come before `id` (inputs) in fn `get`"
        );
        assert_eq!(
            violations[0].suggestion.as_deref(),
            Some("order parameters as: conn, id")
        );
        assert_eq!(
            violations[1].message,
            "parameter `settings` (options) should come before `callback` (callbacks) in fn `put`"
        );
    }

    #[test]
    fn context_types_match_by_substring() {
        let violations = run_file_rule(
            &ParamOrderRule,
            &LintConfig::default(),
            "fn load(id: u64, pool: &ConnectionPool) {}",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "parameter `pool` (context) should come before `id` (inputs) in fn `load`"
        );
    }

    #[test]
    fn destructured_parameters_use_pattern_text() {
        let violations = run_file_rule(
            &ParamOrderRule,
            &LintConfig::default(),
            "fn f((a, b): (u32, u32), ctx: &Context) {}",
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("`(a,b)`"));
    }
}
