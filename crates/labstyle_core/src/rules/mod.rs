//! Convention rules and their registry.
//!
//! # Responsibility
//! - Define the `Rule` contract shared by every built-in convention.
//! - Provide the contexts rules are evaluated against.
//!
//! # Invariants
//! - Rules are pure: they read their context and return violations.
//! - Rules never decide severity; the engine stamps it.

use crate::config::CompiledConfig;
use crate::engine::discover::CrateLayout;
use crate::model::finding::Violation;
use crate::model::rule::RuleDescriptor;
use crate::source::changelog::Changelog;
use crate::source::SourceFile;
use std::path::Path;

pub mod changelog_format;
pub mod field_order;
pub mod module_docs;
pub mod param_order;
pub mod readme_doc;
pub mod registry;
pub mod release_version;
pub mod required_snippet;
pub mod test_layout;
pub mod trait_naming;

mod ordering;
mod walk;

pub use registry::{RegistryError, RuleRegistry};

/// Inputs of a file-scoped rule.
pub struct FileContext<'a> {
    pub file: &'a SourceFile,
    pub syntax: &'a syn::File,
    pub config: &'a CompiledConfig,
}

/// Inputs of a crate-scoped rule.
pub struct CrateContext<'a> {
    pub root: &'a Path,
    pub krate: &'a CrateLayout,
    pub files: Vec<&'a SourceFile>,
    pub changelog: Option<&'a Changelog>,
    pub config: &'a CompiledConfig,
}

/// Inputs of a workspace-scoped rule.
pub struct WorkspaceContext<'a> {
    pub changelog: Option<&'a Changelog>,
    pub config: &'a CompiledConfig,
}

/// One mechanically checkable convention.
///
/// Only the hook matching `descriptor().scope` is called by the engine.
pub trait Rule {
    fn descriptor(&self) -> RuleDescriptor;

    fn check_file(&self, _ctx: &FileContext<'_>) -> Vec<Violation> {
        Vec::new()
    }

    fn check_crate(&self, _ctx: &CrateContext<'_>) -> Vec<Violation> {
        Vec::new()
    }

    fn check_workspace(&self, _ctx: &WorkspaceContext<'_>) -> Vec<Violation> {
        Vec::new()
    }
}

/// Every built-in rule, in registration order.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(field_order::FieldOrderRule),
        Box::new(param_order::ParamOrderRule),
        Box::new(trait_naming::TraitNamingRule),
        Box::new(test_layout::TestLayoutRule),
        Box::new(module_docs::ModuleDocsRule),
        Box::new(required_snippet::RequiredSnippetRule),
        Box::new(readme_doc::ReadmeDocRule),
        Box::new(release_version::ReleaseVersionRule),
        Box::new(changelog_format::ChangelogFormatRule),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{FileContext, Rule};
    use crate::config::{CompiledConfig, LintConfig};
    use crate::model::finding::Violation;
    use crate::source::{FileKind, SourceFile};

    /// Runs a file rule over `text` parsed as `src/lib.rs`.
    pub(crate) fn run_file_rule(rule: &dyn Rule, config: &LintConfig, text: &str) -> Vec<Violation> {
        run_file_rule_at(rule, config, "src/lib.rs", text)
    }

    pub(crate) fn run_file_rule_at(
        rule: &dyn Rule,
        config: &LintConfig,
        path: &str,
        text: &str,
    ) -> Vec<Violation> {
        let compiled = CompiledConfig::compile(config).expect("config compiles");
        let file = SourceFile::parse(path, FileKind::Library, text);
        let syntax = file.syntax.clone().expect("test source parses");
        rule.check_file(&FileContext {
            file: &file,
            syntax: &syntax,
            config: &compiled,
        })
    }
}
