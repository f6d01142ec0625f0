//! `field-order`: named struct fields follow the configured groups.

use crate::model::finding::{Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::ordering::{check_order, OrderedItem};
use crate::rules::walk::for_each_item;
use crate::rules::{FileContext, Rule};
use crate::source::type_text;
use syn::{Fields, Item};

pub struct FieldOrderRule;

impl Rule for FieldOrderRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "field-order",
            summary: "struct fields are ordered identity, data, flags, handles",
            scope: RuleScope::File,
            default_severity: Severity::Warning,
        }
    }

    fn check_file(&self, ctx: &FileContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();
        for_each_item(&ctx.syntax.items, &mut |item: &Item| {
            let Item::Struct(definition) = item else {
                return;
            };
            let Fields::Named(fields) = &definition.fields else {
                return;
            };
            let ordered = fields
                .named
                .iter()
                .filter_map(|field| {
                    let ident = field.ident.as_ref()?;
                    Some(OrderedItem {
                        name: ident.to_string(),
                        type_text: type_text(&field.ty),
                        location: ctx.file.location(ident.span()),
                    })
                })
                .collect::<Vec<_>>();
            let subject = format!("struct `{}`", definition.ident);
            if let Some(violation) =
                check_order(&ctx.config.field_groups, &ordered, "field", &subject)
            {
                violations.push(violation);
            }
        });
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::FieldOrderRule;
    use crate::config::LintConfig;
    use crate::rules::tests::run_file_rule;

    #[test]
    fn accepts_conventional_order() {
        let violations = run_file_rule(
            &FieldOrderRule,
            &LintConfig::default(),
            "struct Record { uuid: Uuid, content: String, is_deleted: bool, _guard: Guard }
             struct Pair(u32, u32);",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn reports_first_out_of_order_field_with_suggestion() {
        let violations = run_file_rule(
            &FieldOrderRule,
            &LintConfig::default(),
            "struct Record {\n    content: String,\n    is_deleted: bool,\n    uuid: Uuid,\n    owner_id: u64,\n}\n",
        );
        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.location.line, Some(4));
        assert_eq!(violation.location.column, Some(5));
        assert_eq!(
            violation.message,
            "field `uuid` (identity) should come before `content` (data) in struct `Record`"
        );
        assert_eq!(
            violation.suggestion.as_deref(),
            Some("order fields as: uuid, owner_id, content, is_deleted")
        );
    }

    #[test]
    fn checks_structs_inside_inline_modules() {
        let violations = run_file_rule(
            &FieldOrderRule,
            &LintConfig::default(),
            "mod inner { pub struct State { is_open: bool, name: String } }",
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("struct `State`"));
    }
}
