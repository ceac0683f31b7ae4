use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn summarize_requires_scan_dir() {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.arg("summarize")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--scan-dir"));
}

#[test]
fn status_fails_cleanly_without_a_database() {
    let tmp = tempfile::tempdir().unwrap();
    let scan_dir = tmp.path().join("results/demo/run-1");
    std::fs::create_dir_all(&scan_dir).unwrap();

    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.arg("status")
        .arg("--scan-dir")
        .arg(&scan_dir)
        .arg("--base-dir")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("strata summarize"));
}
