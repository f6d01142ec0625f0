//! `labstyle.toml` schema, defaults and loading.
//!
//! # Responsibility
//! - Describe every configurable convention declaratively.
//! - Load configuration from disk with documented defaults.
//! - Reject malformed patterns before any file is checked.
//!
//! # Invariants
//! - Missing tables fall back to `LintConfig::default()` values.
//! - Unknown keys are rejected instead of silently ignored.

use crate::model::finding::Severity;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod compiled;

pub use compiled::{classify, CompiledConfig, CompiledGroup, CompiledSnippet};

/// Default config file name looked up at the checked root.
pub const CONFIG_FILE_NAME: &str = "labstyle.toml";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        message: String,
    },
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
    InvalidPattern {
        key: String,
        pattern: String,
        message: String,
    },
    InvalidGlob {
        key: String,
        pattern: String,
        message: String,
    },
    InvalidValue {
        key: String,
        message: String,
    },
    UnknownRule(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "invalid config `{}`: {message}", path.display()),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "invalid config: {message}"),
            Self::InvalidPattern {
                key,
                pattern,
                message,
            } => write!(f, "invalid regex `{pattern}` in `{key}`: {message}"),
            Self::InvalidGlob {
                key,
                pattern,
                message,
            } => write!(f, "invalid glob `{pattern}` in `{key}`: {message}"),
            Self::InvalidValue { key, message } => write!(f, "invalid value for `{key}`: {message}"),
            Self::UnknownRule(id) => write!(f, "config references unknown rule `{id}`"),
        }
    }
}

impl Error for ConfigError {}

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Root-relative globs skipped during discovery.
    pub exclude: Vec<String>,
    /// Per-rule enable flag and severity override, keyed by rule id.
    pub rules: BTreeMap<String, RuleSettings>,
    pub field_order: OrderingConfig,
    pub param_order: OrderingConfig,
    pub trait_naming: TraitNamingConfig,
    #[serde(rename = "required_snippet")]
    pub required_snippets: Vec<SnippetRequirement>,
    pub test_layout: TestLayoutConfig,
    pub module_docs: ModuleDocsConfig,
    pub changelog: ChangelogConfig,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            rules: BTreeMap::new(),
            field_order: OrderingConfig::default_fields(),
            param_order: OrderingConfig::default_params(),
            trait_naming: TraitNamingConfig::default(),
            required_snippets: vec![SnippetRequirement::logging_init()],
            test_layout: TestLayoutConfig::default(),
            module_docs: ModuleDocsConfig::default(),
            changelog: ChangelogConfig::default(),
        }
    }
}

impl LintConfig {
    /// Parses a config document from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            path: None,
            message: err.to_string(),
        })
    }

    /// Reads and parses one config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message: err.to_string(),
        })
    }

    /// Resolves the config for a checked root.
    ///
    /// An explicit path must exist. Without one, `<root>/labstyle.toml` is
    /// used when present and built-in defaults otherwise.
    pub fn load_for_root(root: &Path, explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            info!(
                "event=config_load module=config status=start source=explicit path={}",
                path.display()
            );
            return Self::load(path);
        }

        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            info!(
                "event=config_load module=config status=start source=root path={}",
                candidate.display()
            );
            return Self::load(&candidate);
        }

        warn!(
            "event=config_load module=config status=ok source=defaults root={}",
            root.display()
        );
        Ok(Self::default())
    }

    /// Returns whether a rule should run.
    pub fn rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |settings| settings.enabled)
    }

    /// Returns the configured severity override for a rule, if any.
    pub fn severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|settings| settings.severity)
    }
}

/// `[rules.<id>]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSettings {
    pub enabled: bool,
    pub severity: Option<Severity>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
        }
    }
}

/// Ordered groups for `field-order` and `param-order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderingConfig {
    pub groups: Vec<OrderGroup>,
}

impl OrderingConfig {
    pub fn default_fields() -> Self {
        Self {
            groups: vec![
                OrderGroup::names("identity", r"^(id|uuid|key)$|_id$"),
                OrderGroup::catch_all("data"),
                OrderGroup::names("flags", r"^(is|has|should|can)_"),
                OrderGroup::names("handles", r"^_"),
            ],
        }
    }

    pub fn default_params() -> Self {
        Self {
            groups: vec![
                OrderGroup {
                    name: "context".to_string(),
                    names: Some(r"^(conn|ctx|tx|context)$".to_string()),
                    types: Some(r"(Connection|Context|Transaction)".to_string()),
                },
                OrderGroup::catch_all("inputs"),
                OrderGroup::names("options", r"^(opts|options|config|settings)$"),
                OrderGroup {
                    name: "callbacks".to_string(),
                    names: None,
                    types: Some(r"Fn(Once|Mut)?\(".to_string()),
                },
            ],
        }
    }
}

/// One ordering group. A group without patterns is the catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderGroup {
    pub name: String,
    /// Regex matched against the field or parameter name.
    #[serde(default)]
    pub names: Option<String>,
    /// Regex matched against the whitespace-free type text.
    #[serde(default)]
    pub types: Option<String>,
}

impl OrderGroup {
    pub fn names(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            names: Some(pattern.to_string()),
            types: None,
        }
    }

    pub fn catch_all(name: &str) -> Self {
        Self {
            name: name.to_string(),
            names: None,
            types: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraitNamingConfig {
    /// Every trait name must match this regex.
    pub pattern: String,
    /// No trait name may match any of these.
    pub forbidden: Vec<String>,
}

impl Default for TraitNamingConfig {
    fn default() -> Self {
        Self {
            pattern: r"^[A-Z][A-Za-z0-9]*$".to_string(),
            forbidden: vec![r"^I[A-Z]".to_string(), r"Trait$".to_string()],
        }
    }
}

/// `[[required_snippet]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetRequirement {
    pub id: String,
    /// Crate-relative glob selecting the files that must contain the snippet.
    pub files: String,
    /// Regex the file text must match.
    pub pattern: String,
    pub message: String,
}

impl SnippetRequirement {
    pub fn logging_init() -> Self {
        Self {
            id: "logging-init".to_string(),
            files: "src/main.rs".to_string(),
            pattern: r"init_logging\s*\(".to_string(),
            message: "binary entry point must initialize logging before doing work".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestLayoutConfig {
    /// Required name of inline `#[cfg(test)]` modules.
    pub module_name: String,
    /// Whether the test module must be the last item of its file.
    pub require_last: bool,
}

impl Default for TestLayoutConfig {
    fn default() -> Self {
        Self {
            module_name: "tests".to_string(),
            require_last: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleDocsConfig {
    /// Markdown headings (without `#`) every module doc must contain.
    pub required_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogConfig {
    /// Root-relative changelog path.
    pub path: String,
    pub require_unreleased: bool,
    /// Allowed level-3 headings inside one release entry.
    pub sections: Vec<String>,
    /// Accept a crate version without release entry when `[Unreleased]` exists.
    pub allow_unreleased_version: bool,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: "CHANGELOG.md".to_string(),
            require_unreleased: true,
            sections: ["Added", "Changed", "Deprecated", "Removed", "Fixed", "Security"]
                .iter()
                .map(|value| value.to_string())
                .collect(),
            allow_unreleased_version: false,
        }
    }
}
