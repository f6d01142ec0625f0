//! `trait-naming`: trait names match the required pattern.

use crate::model::finding::{Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::walk::for_each_item;
use crate::rules::{FileContext, Rule};
use syn::Item;

pub struct TraitNamingRule;

impl Rule for TraitNamingRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "trait-naming",
            summary: "trait names are UpperCamelCase without `I` prefix or `Trait` suffix",
            scope: RuleScope::File,
            default_severity: Severity::Warning,
        }
    }

    fn check_file(&self, ctx: &FileContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();
        for_each_item(&ctx.syntax.items, &mut |item: &Item| {
            let Item::Trait(definition) = item else {
                return;
            };
            let name = definition.ident.to_string();
            let location = ctx.file.location(definition.ident.span());

            if !ctx.config.trait_pattern.is_match(&name) {
                violations.push(Violation::new(
                    location.clone(),
                    format!(
                        "trait `{name}` does not match required pattern `{}`",
                        ctx.config.trait_pattern.as_str()
                    ),
                ));
            }
            if let Some(forbidden) = ctx
                .config
                .trait_forbidden
                .iter()
                .find(|pattern| pattern.is_match(&name))
            {
                violations.push(Violation::new(
                    location,
                    format!(
                        "trait `{name}` matches forbidden pattern `{}`",
                        forbidden.as_str()
                    ),
                ));
            }
        });
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::TraitNamingRule;
    use crate::config::LintConfig;
    use crate::rules::tests::run_file_rule;

    #[test]
    fn accepts_role_names() {
        let violations = run_file_rule(
            &TraitNamingRule,
            &LintConfig::default(),
            "pub trait RecordRepository {} trait ProviderSpi {} trait Io {}",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn reports_forbidden_and_malformed_names() {
        let violations = run_file_rule(
            &TraitNamingRule,
            &LintConfig::default(),
            "trait IRepository {}\ntrait StoreTrait {}\n#[allow(non_camel_case_types)]\ntrait snake_case {}\n",
        );
        let messages = violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "trait `IRepository` matches forbidden pattern `^I[A-Z]`",
                "trait `StoreTrait` matches forbidden pattern `Trait$`",
                "trait `snake_case` does not match required pattern `^[A-Z][A-Za-z0-9]*$`",
            ]
        );
        assert_eq!(violations[2].location.line, Some(4));
    }

    #[test]
    fn honours_custom_patterns() {
        let mut config = LintConfig::default();
        config.trait_naming.forbidden = vec!["Manager$".to_string()];
        let violations = run_file_rule(&TraitNamingRule, &config, "trait SessionManager {}");
        assert_eq!(violations.len(), 1);
    }
}
