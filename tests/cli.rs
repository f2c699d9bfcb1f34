// ABOUTME: Integration tests for CLI argument parsing and early validation.
// ABOUTME: Nothing here reaches a cloud API; failures happen before the first call.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("atlantis-deploy").unwrap();
    let dir = std::env::temp_dir();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("preflight"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("lambda"));
}

#[test]
fn deploy_help_shows_strategy_values() {
    cmd()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blue_green"))
        .stdout(predicate::str::contains("--skip-preflight"));
}

#[test]
fn blue_green_without_listener_is_rejected_before_cloud_calls() {
    cmd()
        .args([
            "deploy",
            "--cluster",
            "prod-cluster",
            "--service",
            "atlantis",
            "--task-definition",
            "atlantis:42",
            "--strategy",
            "blue_green",
            "--environment",
            "prod",
            "--blue-tg",
            "arn:tg/blue",
            "--green-tg",
            "arn:tg/green",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("listener ARN"));
}

#[test]
fn unknown_gate_environment_is_a_config_error() {
    cmd()
        .args([
            "deploy",
            "--cluster",
            "c",
            "--service",
            "s",
            "--task-definition",
            "atlantis:1",
            "--environment",
            "preview-7",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown environment: preview-7"));
}

#[test]
fn preflight_rejects_unknown_environment() {
    cmd()
        .args(["preflight", "--environment", "qa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("qa"));
}

#[test]
fn quiet_and_json_conflict() {
    cmd()
        .args(["--quiet", "--json", "preflight", "--environment", "dev"])
        .assert()
        .failure();
}
