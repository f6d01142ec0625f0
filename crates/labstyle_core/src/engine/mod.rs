//! Checker engine.
//!
//! # Responsibility
//! - Discover crates, read and parse their sources.
//! - Dispatch every enabled rule at its scope and stamp severities.
//! - Apply inline suppressions and produce a deterministic report.
//!
//! # Invariants
//! - Findings are sorted by path, line, column, rule id and message.
//! - A file the parser rejects, or that is not UTF-8, yields one `syntax`
//!   finding and no file-rule findings.
//! - The engine never writes to the checked tree.

use crate::config::{CompiledConfig, ConfigError, LintConfig};
use crate::model::finding::{Finding, Location, Severity, Violation};
use crate::model::rule::{RuleDescriptor, RuleScope, SYNTAX_RULE_ID};
use crate::rules::{CrateContext, FileContext, RegistryError, Rule, RuleRegistry, WorkspaceContext};
use crate::source::changelog::Changelog;
use crate::source::{FileKind, SourceFile};
use discover::{discover_workspace, CrateLayout, DiscoveryError};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use suppress::Suppressions;

pub mod discover;
mod suppress;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    Discovery(DiscoveryError),
    Registry(RegistryError),
    Io { path: PathBuf, message: String },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Discovery(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Io { path, message } => write!(f, "failed to read `{}`: {message}", path.display()),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Discovery(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Io { .. } => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DiscoveryError> for EngineError {
    fn from(value: DiscoveryError) -> Self {
        Self::Discovery(value)
    }
}

impl From<RegistryError> for EngineError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// Outcome of one lint run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub root: String,
    pub findings: Vec<Finding>,
    pub files_checked: usize,
    pub crates_checked: usize,
    /// Findings hidden because they are covered by the accepted baseline.
    pub baseline_suppressed: usize,
}

impl LintReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }

    /// Process exit code: `1` when any finding reaches `fail_on`, else `0`.
    pub fn exit_code(&self, fail_on: Severity) -> u8 {
        if self.findings.iter().any(|finding| finding.severity >= fail_on) {
            1
        } else {
            0
        }
    }
}

/// Configured rule runner.
pub struct Linter {
    registry: RuleRegistry,
    config: CompiledConfig,
}

impl Linter {
    /// Validates `config` against `registry` and compiles its patterns.
    pub fn new(registry: RuleRegistry, config: &LintConfig) -> EngineResult<Self> {
        if let Some(unknown) = config
            .rules
            .keys()
            .find(|id| id.as_str() != SYNTAX_RULE_ID && !registry.contains(id))
        {
            return Err(ConfigError::UnknownRule(unknown.clone()).into());
        }
        let config = CompiledConfig::compile(config)?;
        Ok(Self { registry, config })
    }

    /// Linter over every built-in rule.
    pub fn with_builtin_rules(config: &LintConfig) -> EngineResult<Self> {
        Self::new(RuleRegistry::with_builtin_rules()?, config)
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LintConfig {
        &self.config.source
    }

    /// Checks the tree under `root`.
    pub fn check(&self, root: &Path) -> EngineResult<LintReport> {
        let started_at = Instant::now();
        info!(
            "event=lint_run module=engine status=start root={}",
            root.display()
        );

        match self.run(root) {
            Ok(report) => {
                info!(
                    "event=lint_run module=engine status=ok duration_ms={} files={} crates={} errors={} warnings={} infos={}",
                    started_at.elapsed().as_millis(),
                    report.files_checked,
                    report.crates_checked,
                    report.count(Severity::Error),
                    report.count(Severity::Warning),
                    report.count(Severity::Info)
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    "event=lint_run module=engine status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run(&self, root: &Path) -> EngineResult<LintReport> {
        let layout = discover_workspace(root, &self.config)?;

        let mut sources = Vec::with_capacity(layout.file_count());
        for krate in &layout.crates {
            for path in &krate.files {
                sources.push(read_source(root, path, file_kind(krate, path))?);
            }
        }
        for path in &layout.loose_files {
            sources.push(read_source(root, path, FileKind::Other)?);
        }
        let by_path = sources
            .iter()
            .map(|file| (file.path.as_str(), file))
            .collect::<BTreeMap<_, _>>();

        let changelog = self.load_changelog(root)?;

        let mut findings = Vec::new();
        for file in &sources {
            self.check_file(file, &mut findings);
        }

        for krate in &layout.crates {
            let ctx = CrateContext {
                root,
                krate,
                files: krate
                    .files
                    .iter()
                    .filter_map(|path| by_path.get(path.as_str()).copied())
                    .collect(),
                changelog: changelog.as_ref(),
                config: &self.config,
            };
            for rule in self.enabled_rules(RuleScope::Crate) {
                stamp(rule.descriptor(), rule.check_crate(&ctx), &mut findings, self.config());
            }
        }

        let ctx = WorkspaceContext {
            changelog: changelog.as_ref(),
            config: &self.config,
        };
        for rule in self.enabled_rules(RuleScope::Workspace) {
            stamp(rule.descriptor(), rule.check_workspace(&ctx), &mut findings, self.config());
        }

        let suppressions = sources
            .iter()
            .map(|file| (file.path.as_str(), Suppressions::parse(&file.text)))
            .filter(|(_, suppressions)| !suppressions.is_empty())
            .collect::<BTreeMap<_, _>>();
        let before = findings.len();
        findings.retain(|finding| {
            suppressions
                .get(finding.location.path.as_str())
                .map_or(true, |file| !file.covers(&finding.rule_id, finding.location.line))
        });
        if findings.len() != before {
            debug!(
                "event=suppress module=engine status=ok hidden={}",
                before - findings.len()
            );
        }

        findings.sort_by(Finding::report_order);

        Ok(LintReport {
            root: root.display().to_string(),
            findings,
            files_checked: layout.file_count(),
            crates_checked: layout.crates.len(),
            baseline_suppressed: 0,
        })
    }

    fn check_file(&self, file: &SourceFile, findings: &mut Vec<Finding>) {
        let syntax = match &file.syntax {
            Ok(syntax) => syntax,
            Err(failure) => {
                debug!(
                    "event=parse module=engine status=error path={} line={}",
                    file.path, failure.line
                );
                if self.config.source.rule_enabled(SYNTAX_RULE_ID) {
                    let violation = Violation::new(
                        Location::at(file.path.clone(), failure.line, failure.column),
                        format!("file does not parse: {}", failure.message),
                    );
                    let severity = self
                        .config
                        .source
                        .severity_override(SYNTAX_RULE_ID)
                        .unwrap_or(Severity::Error);
                    findings.push(Finding::from_violation(SYNTAX_RULE_ID, severity, violation));
                }
                return;
            }
        };

        let ctx = FileContext {
            file,
            syntax,
            config: &self.config,
        };
        for rule in self.enabled_rules(RuleScope::File) {
            stamp(rule.descriptor(), rule.check_file(&ctx), findings, self.config());
        }
    }

    fn enabled_rules(&self, scope: RuleScope) -> impl Iterator<Item = &dyn Rule> + '_ {
        self.registry
            .list_by_scope(scope)
            .into_iter()
            .filter(|rule| self.config.source.rule_enabled(rule.descriptor().id))
    }

    fn load_changelog(&self, root: &Path) -> EngineResult<Option<Changelog>> {
        let relative = self.config.source.changelog.path.as_str();
        let path = root.join(relative);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|err| EngineError::Io {
            path: path.clone(),
            message: err.to_string(),
        })?;
        Ok(Some(Changelog::parse(relative, &text)))
    }
}

/// Stamps rule output with the rule id and its effective severity.
fn stamp(
    descriptor: RuleDescriptor,
    violations: Vec<Violation>,
    findings: &mut Vec<Finding>,
    config: &LintConfig,
) {
    let severity = config
        .severity_override(descriptor.id)
        .unwrap_or(descriptor.default_severity);
    findings.extend(
        violations
            .into_iter()
            .map(|violation| Finding::from_violation(descriptor.id, severity, violation)),
    );
}

fn file_kind(krate: &CrateLayout, path: &str) -> FileKind {
    let crate_relative = krate.crate_relative(path);
    if crate_relative.starts_with("src/") {
        FileKind::Library
    } else if crate_relative.starts_with("tests/") {
        FileKind::IntegrationTest
    } else {
        FileKind::Other
    }
}

fn read_source(root: &Path, relative: &str, kind: FileKind) -> EngineResult<SourceFile> {
    let path = root.join(relative);
    let bytes = std::fs::read(&path).map_err(|err| EngineError::Io {
        path,
        message: err.to_string(),
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => SourceFile::parse(relative, kind, text),
        Err(err) => SourceFile::undecodable(relative, kind, &err),
    })
}

#[cfg(test)]
mod tests {
    use super::{file_kind, LintReport, Linter};
    use crate::config::{LintConfig, RuleSettings};
    use crate::engine::discover::CrateLayout;
    use crate::engine::EngineError;
    use crate::model::finding::{Finding, Location, Severity, Violation};
    use crate::source::FileKind;

    fn report_with(severities: &[Severity]) -> LintReport {
        LintReport {
            root: "/w".to_string(),
            findings: severities
                .iter()
                .map(|severity| {
                    Finding::from_violation(
                        "field-order",
                        *severity,
                        Violation::new(Location::file("src/lib.rs"), "x"),
                    )
                })
                .collect(),
            files_checked: 1,
            crates_checked: 1,
            baseline_suppressed: 0,
        }
    }

    #[test]
    fn exit_code_follows_fail_threshold() {
        let report = report_with(&[Severity::Warning, Severity::Info]);
        assert_eq!(report.exit_code(Severity::Error), 0);
        assert_eq!(report.exit_code(Severity::Warning), 1);
        assert_eq!(report.count(Severity::Info), 1);
        assert_eq!(report_with(&[]).exit_code(Severity::Info), 0);
    }

    #[test]
    fn rejects_unknown_rule_ids_but_allows_syntax() {
        let mut config = LintConfig::default();
        config
            .rules
            .insert("syntax".to_string(), RuleSettings::default());
        assert!(Linter::with_builtin_rules(&config).is_ok());

        config
            .rules
            .insert("no-such-rule".to_string(), RuleSettings::default());
        assert!(matches!(
            Linter::with_builtin_rules(&config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn classifies_files_by_crate_relative_prefix() {
        let krate = CrateLayout {
            name: "a".to_string(),
            dir: "crates/a".to_string(),
            version: None,
            files: Vec::new(),
        };
        assert_eq!(file_kind(&krate, "crates/a/src/lib.rs"), FileKind::Library);
        assert_eq!(file_kind(&krate, "crates/a/tests/it.rs"), FileKind::IntegrationTest);
        assert_eq!(file_kind(&krate, "crates/a/build.rs"), FileKind::Other);
    }
}
