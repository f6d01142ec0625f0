//! Finding renderers.
//!
//! # Responsibility
//! - Render a `LintReport` for terminals, CI annotations or machines.
//! - Render the rule catalogue for `labstyle rules`.
//!
//! # Invariants
//! - Rendering is pure; output depends only on the report.
//! - Every non-empty rendering ends with a newline.

use crate::engine::LintReport;
use crate::model::finding::{Finding, Severity};
use crate::model::rule::RuleDescriptor;
use std::error::Error;
use std::fmt::{Display, Formatter, Write};
use std::str::FromStr;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    UnknownFormat(String),
    Json(String),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFormat(value) => {
                write!(f, "unsupported format `{value}`; expected text|json|github")
            }
            Self::Json(message) => write!(f, "failed to serialize report: {message}"),
        }
    }
}

impl Error for ReportError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Github,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Github => "github",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "github" => Ok(Self::Github),
            _ => Err(ReportError::UnknownFormat(value.to_string())),
        }
    }
}

/// Renders `report` in the requested format.
pub fn render(report: &LintReport, format: ReportFormat) -> ReportResult<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
        ReportFormat::Github => Ok(render_github(report)),
    }
}

pub fn render_text(report: &LintReport) -> String {
    let mut out = String::new();
    for finding in &report.findings {
        let _ = writeln!(
            out,
            "{}: {}[{}]: {}",
            finding.location, finding.severity, finding.rule_id, finding.message
        );
        if let Some(suggestion) = &finding.suggestion {
            let _ = writeln!(out, "  = help: {suggestion}");
        }
    }

    let scope = format!(
        "across {} file(s) in {} crate(s)",
        report.files_checked, report.crates_checked
    );
    if report.findings.is_empty() {
        let _ = write!(out, "no findings {scope}");
    } else {
        let _ = write!(
            out,
            "{} error(s), {} warning(s), {} info {scope}",
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report.count(Severity::Info)
        );
    }
    if report.baseline_suppressed > 0 {
        let _ = write!(out, "; {} hidden by baseline", report.baseline_suppressed);
    }
    out.push('\n');
    out
}

pub fn render_json(report: &LintReport) -> ReportResult<String> {
    let mut out =
        serde_json::to_string_pretty(report).map_err(|err| ReportError::Json(err.to_string()))?;
    out.push('\n');
    Ok(out)
}

/// GitHub Actions workflow commands, one per finding.
pub fn render_github(report: &LintReport) -> String {
    report.findings.iter().map(github_annotation).collect()
}

fn github_annotation(finding: &Finding) -> String {
    let command = match finding.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    };
    let mut properties = format!("file={}", escape_property(&finding.location.path));
    if let Some(line) = finding.location.line {
        let _ = write!(properties, ",line={line}");
    }
    if let Some(column) = finding.location.column {
        let _ = write!(properties, ",col={column}");
    }
    let _ = write!(properties, ",title={}", escape_property(&finding.rule_id));

    let mut message = finding.message.clone();
    if let Some(suggestion) = &finding.suggestion {
        let _ = write!(message, "\nhelp: {suggestion}");
    }
    format!("::{command} {properties}::{}\n", escape_data(&message))
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Renders the rule catalogue; GitHub output falls back to text.
pub fn render_rules(descriptors: &[RuleDescriptor], format: ReportFormat) -> ReportResult<String> {
    if format == ReportFormat::Json {
        let mut out = serde_json::to_string_pretty(descriptors)
            .map_err(|err| ReportError::Json(err.to_string()))?;
        out.push('\n');
        return Ok(out);
    }

    let width = descriptors
        .iter()
        .map(|descriptor| descriptor.id.len())
        .max()
        .unwrap_or_default();
    let mut out = String::new();
    for descriptor in descriptors {
        let _ = writeln!(
            out,
            "{:<width$}  {:<9}  {:<7}  {}",
            descriptor.id,
            descriptor.scope.as_str(),
            descriptor.default_severity.as_str(),
            descriptor.summary
        );
    }
    Ok(out)
}
