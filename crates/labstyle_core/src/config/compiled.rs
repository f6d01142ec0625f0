//! Validated, ready-to-match form of `LintConfig`.
//!
//! # Invariants
//! - Every regex and glob in the source config compiled successfully.
//! - Ordering configs contain at most one catch-all group.

use super::{ConfigError, ConfigResult, LintConfig, OrderingConfig};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::BTreeSet;

/// Ordering group with compiled patterns.
#[derive(Debug, Clone)]
pub struct CompiledGroup {
    pub name: String,
    pub names: Option<Regex>,
    pub types: Option<Regex>,
}

impl CompiledGroup {
    pub fn is_catch_all(&self) -> bool {
        self.names.is_none() && self.types.is_none()
    }

    fn matches(&self, name: &str, type_text: &str) -> bool {
        self.names.as_ref().is_some_and(|re| re.is_match(name))
            || self.types.as_ref().is_some_and(|re| re.is_match(type_text))
    }
}

/// Resolves the group index of one item.
///
/// The first matching pattern group wins; the catch-all applies only when no
/// pattern group matches. Returns `None` for unconstrained items.
pub fn classify(groups: &[CompiledGroup], name: &str, type_text: &str) -> Option<usize> {
    groups
        .iter()
        .position(|group| !group.is_catch_all() && group.matches(name, type_text))
        .or_else(|| groups.iter().position(CompiledGroup::is_catch_all))
}

#[derive(Debug, Clone)]
pub struct CompiledSnippet {
    pub id: String,
    pub files: GlobMatcher,
    pub pattern: Regex,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub source: LintConfig,
    pub exclude: GlobSet,
    pub field_groups: Vec<CompiledGroup>,
    pub param_groups: Vec<CompiledGroup>,
    pub trait_pattern: Regex,
    pub trait_forbidden: Vec<Regex>,
    pub snippets: Vec<CompiledSnippet>,
}

impl CompiledConfig {
    /// Validates `config` and compiles every pattern it contains.
    pub fn compile(config: &LintConfig) -> ConfigResult<Self> {
        let mut exclude = GlobSetBuilder::new();
        for pattern in &config.exclude {
            exclude.add(compile_glob("exclude", pattern)?);
        }
        let exclude = exclude.build().map_err(|err| ConfigError::InvalidGlob {
            key: "exclude".to_string(),
            pattern: config.exclude.join(", "),
            message: err.to_string(),
        })?;

        let trait_forbidden = config
            .trait_naming
            .forbidden
            .iter()
            .map(|pattern| compile_regex("trait_naming.forbidden", pattern))
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut snippet_ids = BTreeSet::new();
        let mut snippets = Vec::with_capacity(config.required_snippets.len());
        for requirement in &config.required_snippets {
            if requirement.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "required_snippet.id".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            if !snippet_ids.insert(requirement.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "required_snippet.id".to_string(),
                    message: format!("duplicate requirement id `{}`", requirement.id),
                });
            }
            snippets.push(CompiledSnippet {
                id: requirement.id.clone(),
                files: compile_glob("required_snippet.files", &requirement.files)?
                    .compile_matcher(),
                pattern: compile_regex("required_snippet.pattern", &requirement.pattern)?,
                message: requirement.message.clone(),
            });
        }

        if config.test_layout.module_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "test_layout.module_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            source: config.clone(),
            exclude,
            field_groups: compile_groups("field_order", &config.field_order)?,
            param_groups: compile_groups("param_order", &config.param_order)?,
            trait_pattern: compile_regex("trait_naming.pattern", &config.trait_naming.pattern)?,
            trait_forbidden,
            snippets,
        })
    }

    /// Returns whether a root-relative path is excluded from discovery.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude.is_match(relative_path)
    }
}

fn compile_groups(key: &str, ordering: &OrderingConfig) -> ConfigResult<Vec<CompiledGroup>> {
    let mut names = BTreeSet::new();
    let mut catch_all_seen = false;
    let mut groups = Vec::with_capacity(ordering.groups.len());

    for group in &ordering.groups {
        if !names.insert(group.name.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: format!("{key}.groups"),
                message: format!("duplicate group name `{}`", group.name),
            });
        }
        let compiled = CompiledGroup {
            name: group.name.clone(),
            names: group
                .names
                .as_deref()
                .map(|pattern| compile_regex(&format!("{key}.groups.names"), pattern))
                .transpose()?,
            types: group
                .types
                .as_deref()
                .map(|pattern| compile_regex(&format!("{key}.groups.types"), pattern))
                .transpose()?,
        };
        if compiled.is_catch_all() {
            if catch_all_seen {
                return Err(ConfigError::InvalidValue {
                    key: format!("{key}.groups"),
                    message: "only one catch-all group is allowed".to_string(),
                });
            }
            catch_all_seen = true;
        }
        groups.push(compiled);
    }

    Ok(groups)
}

fn compile_regex(key: &str, pattern: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
        key: key.to_string(),
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

fn compile_glob(key: &str, pattern: &str) -> ConfigResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| ConfigError::InvalidGlob {
            key: key.to_string(),
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}
