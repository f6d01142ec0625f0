//! `module-docs`: every `src/` file opens with `//!` docs carrying the
//! configured section headings.

use crate::model::finding::{Location, Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope};
use crate::rules::{FileContext, Rule};
use crate::source::{has_included_module_doc, module_doc_lines, FileKind};

pub struct ModuleDocsRule;

impl Rule for ModuleDocsRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: "module-docs",
            summary: "source files start with `//!` module documentation",
            scope: RuleScope::File,
            default_severity: Severity::Warning,
        }
    }

    fn check_file(&self, ctx: &FileContext<'_>) -> Vec<Violation> {
        if ctx.file.kind != FileKind::Library || ctx.file.is_test_context() {
            return Vec::new();
        }

        let lines = module_doc_lines(ctx.syntax);
        if lines.iter().all(|line| line.trim().is_empty()) {
            if has_included_module_doc(ctx.syntax) {
                // Included documents are not visible here; trust them.
                return Vec::new();
            }
            return vec![Violation::new(
                Location::line(ctx.file.path.clone(), 1),
                "file has no `//!` module documentation",
            )];
        }

        let headings = lines
            .iter()
            .filter_map(|line| {
                let trimmed = line.trim();
                trimmed
                    .starts_with('#')
                    .then(|| trimmed.trim_start_matches('#').trim())
            })
            .collect::<Vec<_>>();

        let missing = ctx
            .config
            .source
            .module_docs
            .required_sections
            .iter()
            .filter(|section| !headings.contains(&section.as_str()))
            .map(|section| format!("`# {section}`"))
            .collect::<Vec<_>>();

        if missing.is_empty() {
            return Vec::new();
        }
        vec![Violation::new(
            Location::line(ctx.file.path.clone(), 1),
            format!("module documentation is missing section(s) {}", missing.join(", ")),
        )]
    }
}
