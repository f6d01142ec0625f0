//! Rule registry.
//!
//! # Responsibility
//! - Hold every rule the engine may run, keyed by stable id.
//! - Index rules by scope so the engine can dispatch per file/crate/root.
//!
//! # Invariants
//! - Rule ids are kebab-case and unique.
//! - Iteration order is sorted by id.

use crate::model::rule::{is_valid_rule_id, RuleDescriptor, RuleScope, SYNTAX_RULE_ID};
use crate::rules::{builtin_rules, Rule};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidRuleId(String),
    DuplicateRuleId(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRuleId(value) => write!(f, "rule id is invalid: {value}"),
            Self::DuplicateRuleId(value) => write!(f, "rule id already registered: {value}"),
        }
    }
}

impl Error for RegistryError {}

/// In-process registry of convention rules.
#[derive(Default)]
pub struct RuleRegistry {
    entries: BTreeMap<&'static str, Box<dyn Rule>>,
    scope_index: BTreeMap<RuleScope, BTreeSet<&'static str>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in rule.
    pub fn with_builtin_rules() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for rule in builtin_rules() {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Registers one rule after id validation.
    pub fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        let descriptor = rule.descriptor();
        if !is_valid_rule_id(descriptor.id) || descriptor.id == SYNTAX_RULE_ID {
            return Err(RegistryError::InvalidRuleId(descriptor.id.to_string()));
        }
        if self.entries.contains_key(descriptor.id) {
            return Err(RegistryError::DuplicateRuleId(descriptor.id.to_string()));
        }

        self.scope_index
            .entry(descriptor.scope)
            .or_default()
            .insert(descriptor.id);
        self.entries.insert(descriptor.id, rule);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.entries.contains_key(rule_id)
    }

    pub fn get(&self, rule_id: &str) -> Option<&dyn Rule> {
        self.entries.get(rule_id).map(|rule| &**rule)
    }

    /// Descriptors of all registered rules, sorted by id.
    pub fn descriptors(&self) -> Vec<RuleDescriptor> {
        self.entries.values().map(|rule| rule.descriptor()).collect()
    }

    /// Rules evaluated at `scope`, sorted by id.
    pub fn list_by_scope(&self, scope: RuleScope) -> Vec<&dyn Rule> {
        let Some(ids) = self.scope_index.get(&scope) else {
            return vec![];
        };
        ids.iter()
            .filter_map(|id| self.entries.get(id).map(|rule| &**rule))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{RegistryError, RuleRegistry};
    use crate::model::finding::Severity;
    use crate::model::rule::{RuleDescriptor, RuleScope};
    use crate::rules::Rule;

    struct NamedRule(&'static str);

    impl Rule for NamedRule {
        fn descriptor(&self) -> RuleDescriptor {
            RuleDescriptor {
                id: self.0,
                summary: "test rule",
                scope: RuleScope::File,
                default_severity: Severity::Info,
            }
        }
    }

    #[test]
    fn registers_builtin_rules_by_scope() {
        let registry = RuleRegistry::with_builtin_rules().expect("builtin registration");
        assert_eq!(registry.len(), 9);
        assert!(registry.contains("field-order"));

        let workspace_rules = registry.list_by_scope(RuleScope::Workspace);
        assert_eq!(workspace_rules.len(), 1);
        assert_eq!(workspace_rules[0].descriptor().id, "changelog-format");

        let ids = registry
            .descriptors()
            .iter()
            .map(|descriptor| descriptor.id)
            .collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn rejects_duplicate_and_invalid_ids() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Box::new(NamedRule("custom-rule")))
            .expect("first registration");
        assert_eq!(
            registry.register(Box::new(NamedRule("custom-rule"))).err(),
            Some(RegistryError::DuplicateRuleId("custom-rule".to_string()))
        );
        assert_eq!(
            registry.register(Box::new(NamedRule("Custom Rule"))).err(),
            Some(RegistryError::InvalidRuleId("Custom Rule".to_string()))
        );
        assert!(matches!(
            registry.register(Box::new(NamedRule("syntax"))),
            Err(RegistryError::InvalidRuleId(_))
        ));
        assert!(registry.get("custom-rule").is_some());
        assert!(registry.list_by_scope(RuleScope::Crate).is_empty());
    }
}
