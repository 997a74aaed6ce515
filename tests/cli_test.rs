//! Binary-level tests: argument handling and exit codes.

use assert_cmd::Command;
use tempfile::TempDir;

fn reportpack() -> Command {
    Command::cargo_bin("reportpack").unwrap()
}

#[test]
fn run_with_missing_config_exits_2() {
    let tmp = TempDir::new().unwrap();
    reportpack()
        .current_dir(tmp.path())
        .args(["run", "--config", "absent.yaml"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicates::str::contains("config error"));
}

#[test]
fn init_creates_config_and_refuses_overwrite() {
    let tmp = TempDir::new().unwrap();

    reportpack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicates::str::contains("Created config.yaml"));
    assert!(tmp.path().join("config.yaml").exists());

    reportpack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("--force"));

    reportpack()
        .current_dir(tmp.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn run_over_init_config_with_no_inputs_exits_2() {
    let tmp = TempDir::new().unwrap();
    reportpack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    std::fs::create_dir_all(tmp.path().join("data/in")).unwrap();

    reportpack()
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .failure()
        .code(2)
        .stderr(predicates::str::contains("ingest error"));
}

#[test]
fn pdf_flags_conflict() {
    reportpack()
        .args(["run", "--pdf", "--no-pdf"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("cannot be used with"));
}
