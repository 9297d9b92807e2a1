#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::hk;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn reports_addresses_by_descending_count() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    fs::write(dir.join("access.log"), "1.2.3.4 1.2.3.4 5.6.7.8\n").unwrap();

    hk(dir)
        .arg("logs")
        .arg("access.log")
        .assert()
        .success()
        .stdout("      2 1.2.3.4\n      1 5.6.7.8\n");
}

#[test]
fn report_is_capped_at_five_entries() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let log: String = (1..=7)
        .map(|i| format!("GET / from 10.0.0.{i}\n").repeat(i))
        .collect();
    fs::write(dir.join("access.log"), log).unwrap();

    let output = hk(dir).arg("logs").arg("access.log").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let ips: Vec<&str> = stdout
        .lines()
        .map(|line| line.split_whitespace().nth(1).unwrap())
        .collect();
    assert_eq!(
        ips,
        vec!["10.0.0.7", "10.0.0.6", "10.0.0.5", "10.0.0.4", "10.0.0.3"]
    );
}

#[test]
fn log_without_addresses_reports_nothing() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    fs::write(dir.join("app.log"), "started\nready\n").unwrap();

    hk(dir)
        .arg("logs")
        .arg("app.log")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_log_exits_with_one() {
    let temp = tempdir().expect("failed to create tempdir");

    hk(temp.path())
        .arg("logs")
        .arg("nope.log")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("nope.log"));
}

#[test]
fn json_output_and_top_override() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    fs::write(dir.join("access.log"), "9.9.9.9\n8.8.8.8\n8.8.8.8\n").unwrap();

    let output = hk(dir)
        .args(["logs", "access.log", "--json", "--top", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value, serde_json::json!([{ "ip": "8.8.8.8", "count": 2 }]));
}

#[test]
fn top_comes_from_config_file() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    fs::write(dir.join("access.log"), "1.1.1.1\n2.2.2.2\n3.3.3.3\n").unwrap();
    fs::write(dir.join("hostkeep.yaml"), "logs:\n  top: 2\n").unwrap();

    hk(dir)
        .arg("logs")
        .arg("access.log")
        .assert()
        .success()
        .stdout("      1 1.1.1.1\n      1 2.2.2.2\n");
}

#[test]
fn fatal_error_is_reported_once() {
    let temp = tempdir().expect("failed to create tempdir");

    let output = hk(temp.path())
        .args(["logs", "gone.log"])
        .output()
        .expect("failed to run hk");
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("gone.log").count(), 1, "stderr: {stderr}");
    assert!(stderr.starts_with("Error: "), "stderr: {stderr}");
}
