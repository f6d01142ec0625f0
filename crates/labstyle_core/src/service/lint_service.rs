//! Lint use-case service.
//!
//! # Responsibility
//! - Run the linter, hide baseline-covered findings and record the run.
//! - Accept or clear the baseline of a checked root.
//!
//! # Invariants
//! - Baseline matching is a multiset on fingerprints: each accepted
//!   occurrence hides at most one current finding.
//! - Roots are keyed by their canonical path.

use crate::engine::{EngineError, LintReport, Linter};
use crate::repo::baseline_repo::{Baseline, BaselineRepository};
use crate::repo::run_repo::{LintRun, RunRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Engine(EngineError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Linter wired to run history and baseline storage.
pub struct LintService<R: RunRepository, B: BaselineRepository> {
    linter: Linter,
    runs: R,
    baselines: B,
}

impl<R: RunRepository, B: BaselineRepository> LintService<R, B> {
    pub fn new(linter: Linter, runs: R, baselines: B) -> Self {
        Self {
            linter,
            runs,
            baselines,
        }
    }

    /// Checks `root`, hides baseline findings and records the run.
    pub fn check(&self, root: &Path) -> ServiceResult<(LintReport, LintRun)> {
        let root = canonical_root(root);
        let mut report = self.linter.check(&root)?;
        let baseline = self.baselines.load_baseline(&report.root)?;
        apply_baseline(&mut report, &baseline);

        let run = LintRun::from_report(&report, now_epoch_ms());
        self.runs.record_run(&run, &report.findings)?;
        info!(
            "event=run_record module=service status=ok run_id={} findings={} baseline_suppressed={}",
            run.id,
            report.findings.len(),
            report.baseline_suppressed
        );
        Ok((report, run))
    }

    /// Stores every current finding of `root` as its new baseline.
    pub fn accept_baseline(&self, root: &Path) -> ServiceResult<usize> {
        let root = canonical_root(root);
        let report = self.linter.check(&root)?;
        let accepted = self
            .baselines
            .replace_baseline(&report.root, &report.findings)?;
        info!("event=baseline_accept module=service status=ok findings={accepted}");
        Ok(accepted)
    }

    /// Forgets the baseline of `root`.
    pub fn clear_baseline(&self, root: &Path) -> ServiceResult<usize> {
        let key = canonical_root(root).display().to_string();
        let removed = self.baselines.clear_baseline(&key)?;
        info!("event=baseline_clear module=service status=ok entries={removed}");
        Ok(removed)
    }

    pub fn history(&self, limit: u32) -> ServiceResult<Vec<LintRun>> {
        Ok(self.runs.list_runs(limit)?)
    }
}

/// Removes findings covered by `baseline`, keeping report order.
pub fn apply_baseline(report: &mut LintReport, baseline: &Baseline) {
    let mut remaining = baseline.clone();
    let before = report.findings.len();
    report.findings.retain(|finding| {
        match remaining.get_mut(&finding.fingerprint()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        }
    });
    report.baseline_suppressed += before - report.findings.len();
}

fn canonical_root(root: &Path) -> PathBuf {
    // A missing root is left as given so discovery reports it.
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
mod tests {
    use super::apply_baseline;
    use crate::engine::LintReport;
    use crate::model::finding::{Finding, Location, Severity, Violation};
    use crate::repo::baseline_repo::baseline_of;

    fn finding(line: usize, message: &str) -> Finding {
        Finding::from_violation(
            "trait-naming",
            Severity::Warning,
            Violation::new(Location::at("src/lib.rs", line, 7), message),
        )
    }

    #[test]
    fn baseline_hides_each_accepted_occurrence_once() {
        let accepted = baseline_of(&[finding(1, "a"), finding(2, "b")]);
        let mut report = LintReport {
            root: "/w".to_string(),
            findings: vec![finding(5, "a"), finding(6, "a"), finding(7, "b"), finding(8, "c")],
            files_checked: 1,
            crates_checked: 1,
            baseline_suppressed: 0,
        };
        apply_baseline(&mut report, &accepted);

        let lines = report
            .findings
            .iter()
            .map(|finding| finding.location.line)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![Some(6), Some(8)]);
        assert_eq!(report.baseline_suppressed, 2);
    }
}
