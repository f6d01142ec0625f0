//! Accepted-finding baselines, one per checked root.
//!
//! # Invariants
//! - Entries are keyed by `(root, fingerprint)` and count occurrences, so
//!   duplicated findings are accepted as a multiset.
//! - Replacing a baseline is atomic.

use crate::model::finding::Finding;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Fingerprint to accepted occurrence count.
pub type Baseline = BTreeMap<String, usize>;

/// Counts findings per fingerprint.
pub fn baseline_of(findings: &[Finding]) -> Baseline {
    let mut baseline = Baseline::new();
    for finding in findings {
        *baseline.entry(finding.fingerprint()).or_default() += 1;
    }
    baseline
}

pub trait BaselineRepository {
    /// Replaces the baseline of `root`; returns the number of accepted findings.
    fn replace_baseline(&self, root: &str, findings: &[Finding]) -> RepoResult<usize>;
    fn load_baseline(&self, root: &str) -> RepoResult<Baseline>;
    /// Drops the baseline of `root`; returns the number of removed entries.
    fn clear_baseline(&self, root: &str) -> RepoResult<usize>;
}

pub struct SqliteBaselineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBaselineRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BaselineRepository for SqliteBaselineRepository<'_> {
    fn replace_baseline(&self, root: &str, findings: &[Finding]) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM baseline_entries WHERE root = ?1;", [root])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO baseline_entries (root, fingerprint, occurrences, accepted_at)
                 VALUES (?1, ?2, ?3, strftime('%s', 'now') * 1000);",
            )?;
            for (fingerprint, occurrences) in baseline_of(findings) {
                insert.execute(params![root, fingerprint, occurrences])?;
            }
        }
        tx.commit()?;
        Ok(findings.len())
    }

    fn load_baseline(&self, root: &str) -> RepoResult<Baseline> {
        let mut stmt = self.conn.prepare(
            "SELECT fingerprint, occurrences
             FROM baseline_entries
             WHERE root = ?1
             ORDER BY fingerprint ASC;",
        )?;
        let mut rows = stmt.query([root])?;
        let mut baseline = Baseline::new();
        while let Some(row) = rows.next()? {
            baseline.insert(row.get("fingerprint")?, row.get("occurrences")?);
        }
        Ok(baseline)
    }

    fn clear_baseline(&self, root: &str) -> RepoResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM baseline_entries WHERE root = ?1;", [root])?)
    }
}

#[cfg(test)]
mod tests {
    use super::{BaselineRepository, SqliteBaselineRepository};
    use crate::db::open_db_in_memory;
    use crate::model::finding::{Finding, Location, Severity, Violation};

    fn finding(line: usize, message: &str) -> Finding {
        Finding::from_violation(
            "field-order",
            Severity::Warning,
            Violation::new(Location::at("src/lib.rs", line, 1), message),
        )
    }

    #[test]
    fn stores_baselines_per_root_as_multiset() {
        let conn = open_db_in_memory().expect("db");
        let repo = SqliteBaselineRepository::new(&conn);
        let accepted = repo
            .replace_baseline("/a", &[finding(1, "x"), finding(9, "x"), finding(3, "y")])
            .expect("replace");
        assert_eq!(accepted, 3);
        repo.replace_baseline("/b", &[finding(1, "z")]).expect("replace");

        let baseline = repo.load_baseline("/a").expect("load");
        assert_eq!(baseline.get("field-order|src/lib.rs|x"), Some(&2));
        assert_eq!(baseline.get("field-order|src/lib.rs|y"), Some(&1));
        assert_eq!(baseline.len(), 2);

        repo.replace_baseline("/a", &[finding(1, "y")]).expect("replace");
        assert_eq!(repo.load_baseline("/a").expect("load").len(), 1);

        assert_eq!(repo.clear_baseline("/a").expect("clear"), 1);
        assert!(repo.load_baseline("/a").expect("load").is_empty());
        assert_eq!(repo.load_baseline("/b").expect("load").len(), 1);
    }
}
