#![cfg(unix)]

#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{fake_manager, hk, manager_calls};
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn running_service_is_never_started() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &["nginx"], 0);

    hk(dir)
        .arg("services")
        .arg("nginx")
        .arg("--manager")
        .arg(&manager)
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout("nginx is running\n");

    assert_eq!(manager_calls(dir), vec!["is-active --quiet nginx"]);
}

#[test]
fn consent_starts_the_stopped_service_by_name() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &["nginx"], 0);

    hk(dir)
        .args(["services", "nginx", "ssh"])
        .arg("--manager")
        .arg(&manager)
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("nginx is running"))
        .stdout(predicate::str::contains("ssh is not running"))
        .stdout(predicate::str::contains("ssh started"))
        .stderr(predicate::str::contains("Start ssh? (y/n)"));

    assert_eq!(
        manager_calls(dir),
        vec![
            "is-active --quiet nginx",
            "is-active --quiet ssh",
            "start ssh"
        ]
    );
}

#[test]
fn anything_but_lowercase_y_declines() {
    for answer in ["n\n", "Y\n", "yes\n", ""] {
        let temp = tempdir().expect("failed to create tempdir");
        let dir = temp.path();
        let manager = fake_manager(dir, &[], 0);

        hk(dir)
            .arg("services")
            .arg("cron")
            .arg("--manager")
            .arg(&manager)
            .write_stdin(answer)
            .assert()
            .success()
            .stdout(predicate::str::contains("cron is not running"))
            .stdout(predicate::str::contains("started").not());

        assert!(
            !manager_calls(dir).iter().any(|call| call.starts_with("start")),
            "answer {answer:?} should not start the service"
        );
    }
}

#[test]
fn failed_start_propagates_exit_code() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &[], 4);

    hk(dir)
        .args(["services", "db", "web", "--yes"])
        .arg("--manager")
        .arg(&manager)
        .assert()
        .code(4)
        .stdout(predicate::str::contains("db failed to start (exit status 4)"))
        .stderr(predicate::str::contains("Failed to start service 'db'"));

    // The pass continues after the first failure.
    assert!(manager_calls(dir).contains(&"start web".to_string()));
}

#[test]
fn no_prompt_only_reports() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &[], 0);

    hk(dir)
        .args(["services", "cron", "--no-prompt"])
        .arg("--manager")
        .arg(&manager)
        .assert()
        .success()
        .stdout("cron is not running\n");

    assert_eq!(manager_calls(dir), vec!["is-active --quiet cron"]);
}

#[test]
fn names_and_manager_come_from_config() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &["sshd"], 0);
    fs::write(
        dir.join("hostkeep.yaml"),
        format!(
            "services:\n  names: [sshd, cups]\n  manager: \"{}\"\n",
            manager.display()
        ),
    )
    .unwrap();

    hk(dir)
        .args(["services", "--no-prompt"])
        .assert()
        .success()
        .stdout("sshd is running\ncups is not running\n");
}

#[test]
fn json_output_is_a_single_document() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &["nginx"], 0);

    let output = hk(dir)
        .args(["services", "nginx", "cups", "--no-prompt", "--json"])
        .arg("--manager")
        .arg(&manager)
        .output()
        .expect("failed to run hk");
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(
        value,
        serde_json::json!({
            "outcomes": [
                { "name": "nginx", "status": "running", "action": "none" },
                { "name": "cups", "status": "stopped", "action": "none" }
            ]
        })
    );
}

#[test]
fn json_output_survives_failed_start() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let manager = fake_manager(dir, &[], 5);

    let output = hk(dir)
        .args(["services", "db", "--yes", "--json"])
        .arg("--manager")
        .arg(&manager)
        .output()
        .expect("failed to run hk");
    assert_eq!(output.status.code(), Some(5));

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["outcomes"][0]["action"], serde_json::json!({ "start_failed": 5 }));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Failed to start service 'db'").count(),
        1,
        "fatal error should be reported once: {stderr}"
    );
}

#[test]
fn missing_manager_reports_unknown_status() {
    let temp = tempdir().expect("failed to create tempdir");

    hk(temp.path())
        .args(["services", "nginx", "--yes", "--manager", "/nonexistent/systemctl"])
        .assert()
        .success()
        .stdout("nginx status is unknown\n");
}

#[test]
fn nothing_configured_is_not_an_error() {
    let temp = tempdir().expect("failed to create tempdir");

    hk(temp.path())
        .arg("services")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
