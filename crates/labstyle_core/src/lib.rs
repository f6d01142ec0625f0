#![doc = include_str!("../README.md")]

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod rules;
pub mod service;
pub mod source;

pub use config::{ConfigError, LintConfig, CONFIG_FILE_NAME};
pub use engine::{EngineError, EngineResult, LintReport, Linter};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::finding::{parse_severity, Finding, Location, Severity};
pub use model::rule::{RuleDescriptor, RuleScope};
pub use report::{render, render_rules, ReportError, ReportFormat};
pub use repo::baseline_repo::{BaselineRepository, SqliteBaselineRepository};
pub use repo::run_repo::{LintRun, RunRepository, SqliteRunRepository};
pub use repo::{RepoError, RepoResult};
pub use rules::{RegistryError, RuleRegistry};
pub use service::lint_service::{LintService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
