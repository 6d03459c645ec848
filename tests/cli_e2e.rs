//! End-to-end smoke tests of the binary surface.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_documents_the_published_flags() {
    let mut cmd = Command::cargo_bin("facegrab").expect("binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--crop_face"))
        .stdout(predicate::str::contains("--max_retries"))
        .stdout(predicate::str::contains("--start_at_line"))
        .stdout(predicate::str::contains("--end_at_line"))
        .stdout(predicate::str::contains("--logfile"));
}

#[test]
fn test_missing_positionals_fail_fast() {
    let mut cmd = Command::cargo_bin("facegrab").expect("binary exists");
    cmd.assert().failure();
}

#[test]
fn test_unopenable_manifest_aborts_with_log_entry() {
    let work_dir = TempDir::new().expect("temp dir");
    let logfile = work_dir.path().join("download.log");

    let mut cmd = Command::cargo_bin("facegrab").expect("binary exists");
    cmd.current_dir(work_dir.path())
        .arg("no-such-manifest.txt")
        .arg("dataset/")
        .arg("--logfile")
        .arg(&logfile)
        .assert()
        .failure();

    let log = std::fs::read_to_string(&logfile).expect("logfile written");
    assert!(
        log.contains("manifest"),
        "expected fatal manifest entry in log, got: {log}"
    );
    // Fatal before any record: no dataset tree may exist.
    assert!(!work_dir.path().join("dataset").exists());
}

#[test]
fn test_logfile_captures_info_entries_when_console_is_quiet() {
    let work_dir = TempDir::new().expect("temp dir");
    let logfile = work_dir.path().join("download.log");

    let mut cmd = Command::cargo_bin("facegrab").expect("binary exists");
    cmd.current_dir(work_dir.path())
        .env_remove("RUST_LOG")
        .arg("no-such-manifest.txt")
        .arg("dataset/")
        .arg("--quiet")
        .arg("--logfile")
        .arg(&logfile)
        .assert()
        .failure()
        .stdout(predicate::str::contains("facegrab starting").not());

    // The file sink filters independently of the console: startup info
    // entries land in the logfile even under --quiet.
    let log = std::fs::read_to_string(&logfile).expect("logfile written");
    assert!(
        log.contains("facegrab starting"),
        "expected startup entry in log, got: {log}"
    );
}

#[test]
fn test_zero_timeout_rejected_at_parse_time() {
    let mut cmd = Command::cargo_bin("facegrab").expect("binary exists");
    cmd.args(["manifest.txt", "dataset/", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"));
}
