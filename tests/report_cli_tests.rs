//! End-to-end tests for the `ssp-report` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn populated_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("parse.sta"), "12 0.600000 0.050000\n").unwrap();
    fs::write(dir.path().join("build.sta"), "1 9.000000 9.000000\n").unwrap();
    fs::write(dir.path().join("fetch.sta"), "3 1.500000 0.500000\n").unwrap();
    dir
}

#[test]
fn test_text_report_sorted_by_total() {
    let dir = populated_dir();
    let output = cargo_bin_cmd!("ssp-report")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parse = stdout.find("parse").unwrap();
    let fetch = stdout.find("fetch").unwrap();
    let build = stdout.find("build").unwrap();
    assert!(parse < fetch && fetch < build, "unexpected order:\n{stdout}");
    assert!(stdout.contains("Avg Time"));
    assert!(stdout.contains("11.100000s"));
}

#[test]
fn test_csv_report_sorted_by_calls_descending() {
    let dir = populated_dir();
    cargo_bin_cmd!("ssp-report")
        .args(["--format", "csv", "--sort", "calls", "--reverse"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(
            "function,calls,total,average\n\
             parse,12,0.600000,0.050000\n\
             fetch,3,1.500000,0.500000\n\
             build,1,9.000000,9.000000\n",
        );
}

#[test]
fn test_json_report_with_running_calls() {
    let dir = populated_dir();
    fs::write(dir.path().join("walk.lvl"), "2\n").unwrap();
    fs::write(dir.path().join("walk.str"), "1700000000.000001\n").unwrap();

    let output = cargo_bin_cmd!("ssp-report")
        .args(["--format", "json", "--running", "--sort", "average"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["functions"][0]["function"], "parse");
    assert_eq!(value["functions"][2]["function"], "build");
    assert_eq!(value["running"][0]["function"], "walk");
    assert_eq!(value["running"][0]["depth"], 2);
    assert_eq!(value["running"][0]["since"], "1700000000.000001");
}

#[test]
fn test_report_after_profiling() {
    let dir = TempDir::new().unwrap();
    for mode in ["enter", "leave"] {
        cargo_bin_cmd!("ssp")
            .args([mode, "traced"])
            .arg(dir.path())
            .assert()
            .success();
    }

    cargo_bin_cmd!("ssp-report")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("traced"));
}

#[test]
fn test_report_on_empty_dir() {
    let dir = TempDir::new().unwrap();
    cargo_bin_cmd!("ssp-report")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No function statistics collected."));
}

#[test]
fn test_report_on_missing_dir_fails() {
    let dir = TempDir::new().unwrap();
    cargo_bin_cmd!("ssp-report")
        .arg(dir.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read statistics"));
}
