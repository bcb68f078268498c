//! End-to-end tests for the `trellis` binary
//!
//! These run the bundled suites through the real command line and check
//! exit codes and both output formats.

use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn trellis(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("trellis");
    cmd.current_dir(dir.path())
        .env_remove("TRELLIS_FORMAT")
        .env_remove("TRELLIS_SUITE_CONCURRENCY")
        .env_remove("TRELLIS_VERBOSE")
        .env_remove("TRELLIS_PAGE_SIZE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

// ============================================================================
// trellis run
// ============================================================================

#[test]
fn test_run_passes() {
    let dir = TempDir::new().unwrap();
    trellis(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED"))
        .stdout(predicate::str::contains("fib"))
        .stdout(predicate::str::contains("lifecycle"));
}

#[test]
fn test_run_verbose_shows_subtests() {
    let dir = TempDir::new().unwrap();
    trellis(&dir)
        .args(["run", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("level 1"))
        .stdout(predicate::str::contains("reached the bottom"));
}

#[test]
fn test_run_with_failures_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    trellis(&dir)
        .args(["run", "--with-failures"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"))
        .stdout(predicate::str::contains("failures :: fail now/stops early"))
        .stdout(predicate::str::contains("after test: temporary directory still exists"));
}

#[test]
fn test_contained_panics_are_not_printed() {
    let dir = TempDir::new().unwrap();
    trellis(&dir)
        .args(["run", "--with-failures"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("panic: index out of bounds"))
        .stderr(predicate::str::contains("panicked at").not());
}

#[test]
fn test_run_json_output() {
    let dir = TempDir::new().unwrap();
    let output = trellis(&dir).args(["run", "--json"]).output().unwrap();
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["result"], "passed");
    let suites: Vec<_> = tree["subtests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(suites, vec!["fib", "lifecycle"]);
}

#[test]
fn test_config_file_selects_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("trellis.toml"),
        "[report]\nformat = \"json\"\n\n[engine]\nsuite_concurrency = 2\n",
    )
    .unwrap();

    trellis(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("trellis.toml"), "[engine]\nsuite_concurrency = 0\n").unwrap();

    trellis(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("suite_concurrency"));
}

// ============================================================================
// trellis list
// ============================================================================

#[test]
fn test_list_shows_run_order() {
    let dir = TempDir::new().unwrap();
    trellis(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("70th Fibonacci number"))
        .stdout(predicate::str::contains("before suite, before test, after test, after suite"))
        .stdout(predicate::str::contains("4 tests in 2 suites"));
}
