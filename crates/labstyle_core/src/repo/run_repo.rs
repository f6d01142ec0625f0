//! Lint run history.
//!
//! # Invariants
//! - A run and its findings are written in one transaction.
//! - Stored findings keep report order through their ordinal.

use crate::engine::LintReport;
use crate::model::finding::{parse_severity, Finding, Location, Severity};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub type RunId = Uuid;

/// Maximum rows `list_runs` returns in one call.
pub const RUNS_LIMIT_MAX: u32 = 500;

/// Summary row of one recorded check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRun {
    pub id: RunId,
    /// Checked root as recorded in the report.
    pub root: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub baseline_suppressed: usize,
}

impl LintRun {
    /// New run record with a fresh id.
    pub fn from_report(report: &LintReport, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            root: report.root.clone(),
            created_at,
            error_count: report.count(Severity::Error),
            warning_count: report.count(Severity::Warning),
            info_count: report.count(Severity::Info),
            baseline_suppressed: report.baseline_suppressed,
        }
    }
}

pub trait RunRepository {
    fn record_run(&self, run: &LintRun, findings: &[Finding]) -> RepoResult<()>;
    /// Newest runs first.
    fn list_runs(&self, limit: u32) -> RepoResult<Vec<LintRun>>;
    fn run_findings(&self, run_id: RunId) -> RepoResult<Vec<Finding>>;
}

pub struct SqliteRunRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRunRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RunRepository for SqliteRunRepository<'_> {
    fn record_run(&self, run: &LintRun, findings: &[Finding]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let run_id = run.id.to_string();
        tx.execute(
            "INSERT INTO lint_runs (
                id,
                root,
                created_at,
                error_count,
                warning_count,
                info_count,
                baseline_suppressed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                run_id,
                run.root,
                run.created_at,
                run.error_count,
                run.warning_count,
                run.info_count,
                run.baseline_suppressed,
            ],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO run_findings (
                    run_id,
                    ordinal,
                    rule_id,
                    severity,
                    path,
                    line,
                    column_number,
                    message,
                    suggestion
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            )?;
            for (ordinal, finding) in findings.iter().enumerate() {
                insert.execute(params![
                    run_id,
                    ordinal,
                    finding.rule_id,
                    finding.severity.as_str(),
                    finding.location.path,
                    finding.location.line,
                    finding.location.column,
                    finding.message,
                    finding.suggestion,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn list_runs(&self, limit: u32) -> RepoResult<Vec<LintRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, root, created_at, error_count, warning_count, info_count, baseline_suppressed
             FROM lint_runs
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([limit.min(RUNS_LIMIT_MAX)])?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next()? {
            runs.push(parse_run_row(row)?);
        }
        Ok(runs)
    }

    fn run_findings(&self, run_id: RunId) -> RepoResult<Vec<Finding>> {
        let run_id_text = run_id.to_string();
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM lint_runs WHERE id = ?1;",
                [run_id_text.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::RunNotFound(run_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT rule_id, severity, path, line, column_number, message, suggestion
             FROM run_findings
             WHERE run_id = ?1
             ORDER BY ordinal ASC;",
        )?;
        let mut rows = stmt.query([run_id_text.as_str()])?;
        let mut findings = Vec::new();
        while let Some(row) = rows.next()? {
            findings.push(parse_finding_row(row)?);
        }
        Ok(findings)
    }
}

fn parse_run_row(row: &Row<'_>) -> RepoResult<LintRun> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in lint_runs.id")))?;
    Ok(LintRun {
        id,
        root: row.get("root")?,
        created_at: row.get("created_at")?,
        error_count: row.get("error_count")?,
        warning_count: row.get("warning_count")?,
        info_count: row.get("info_count")?,
        baseline_suppressed: row.get("baseline_suppressed")?,
    })
}

fn parse_finding_row(row: &Row<'_>) -> RepoResult<Finding> {
    let severity_text: String = row.get("severity")?;
    let severity = parse_severity(&severity_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid severity `{severity_text}` in run_findings.severity"
        ))
    })?;
    Ok(Finding {
        rule_id: row.get("rule_id")?,
        severity,
        location: Location {
            path: row.get("path")?,
            line: row.get("line")?,
            column: row.get("column_number")?,
        },
        message: row.get("message")?,
        suggestion: row.get("suggestion")?,
    })
}
