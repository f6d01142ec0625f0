use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn seed_clean_crate(root: &Path) {
    write(
        root,
        "Cargo.toml",
        "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n",
    );
    write(
        root,
        "CHANGELOG.md",
        "# Changelog\n\n## [Unreleased]\n\n## [0.1.0] - 2024-01-01\n\n### Added\n- ping\n",
    );
    write(root, "README.md", "# demo\n");
    write(
        root,
        "src/lib.rs",
        "//! Demo crate.\n#![doc = include_str!(\"../README.md\")]\n\npub fn ping() -> &'static str {\n    \"pong\"\n}\n",
    );
}

fn add_field_order_violation(root: &Path) {
    write(
        root,
        "src/model.rs",
        "//! Model.\n\npub struct Item {\n    pub name: String,\n    pub id: u64,\n}\n",
    );
}

fn labstyle() -> Command {
    Command::cargo_bin("labstyle").unwrap()
}

#[test]
fn rules_lists_every_builtin_rule() {
    labstyle()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("field-order"))
        .stdout(predicate::str::contains("changelog-format  workspace"));
}

#[test]
fn clean_workspace_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    seed_clean_crate(dir.path());

    labstyle()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("no findings across 1 file(s) in 1 crate(s)"));
}

#[test]
fn fail_threshold_controls_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    seed_clean_crate(dir.path());
    add_field_order_violation(dir.path());

    labstyle()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "src/model.rs:5:9: warning[field-order]: field `id` (identity) should come before `name` (data) in struct `Item`",
        ))
        .stdout(predicate::str::contains("  = help: order fields as: id, name"));

    labstyle()
        .args(["check", "--fail-on", "warning", "--format", "github"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "::warning file=src/model.rs,line=5,col=9,title=field-order::",
        ));
}

#[test]
fn invalid_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    seed_clean_crate(dir.path());
    write(dir.path(), "labstyle.toml", "unknown_key = true\n");

    labstyle()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn bad_arguments_exit_two() {
    labstyle()
        .args(["check", "--format", "sarif"])
        .assert()
        .code(2);
}

#[test]
fn baseline_hides_accepted_findings_and_history_records_runs() {
    let dir = tempfile::tempdir().unwrap();
    seed_clean_crate(dir.path());
    add_field_order_violation(dir.path());
    let db = dir.path().join("state").join("labstyle.db");
    fs::create_dir_all(db.parent().unwrap()).unwrap();

    labstyle()
        .args(["baseline", "accept"])
        .arg(dir.path())
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted 1 finding(s)"));

    labstyle()
        .args(["check", "--fail-on", "info"])
        .arg(dir.path())
        .arg("--db")
        .arg(&db)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("no findings"))
        .stdout(predicate::str::contains("1 hidden by baseline"));

    labstyle()
        .args(["history", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 error(s), 0 warning(s), 0 info, 1 hidden by baseline"));

    labstyle()
        .args(["baseline", "clear"])
        .arg(dir.path())
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 baseline entry"));
}

#[test]
fn log_dir_receives_log_files() {
    let dir = tempfile::tempdir().unwrap();
    seed_clean_crate(dir.path());
    let logs = dir.path().join("logs");

    labstyle()
        .arg("--log-dir")
        .arg(&logs)
        .args(["--log-level", "info", "check"])
        .arg(dir.path())
        .assert()
        .success();

    let entries = fs::read_dir(&logs).unwrap().count();
    assert!(entries > 0);
}
