//! Integration tests for argument parsing, static commands and early
//! failures of the daemon-backed commands.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with a config file path that does not exist, so every run starts
/// from defaults.
fn studentbox(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("studentbox"));
    cmd.env("NO_COLOR", "1")
        .env("STUDENTBOX_CONFIG", home.path().join("config.yaml"))
        .env_remove("HOSTPATH")
        .env_remove("DATAPATH")
        .env_remove("STUDENTBOX_SOCKET")
        .env_remove("STUDENTBOX_LOG");
    cmd
}

fn home() -> TempDir {
    TempDir::new().expect("tempdir")
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    studentbox(&home())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_lists_commands() {
    let output = studentbox(&home()).arg("--help").output().expect("run");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["list", "status", "spawn", "run", "envs", "remove", "runtimes"] {
        assert!(help.contains(command), "missing {command} in:\n{help}");
    }
}

#[test]
fn test_version_command_shows_version() {
    studentbox(&home())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "studentbox v{}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_no_color_env_accepts_any_value() {
    let home = home();
    for value in ["1", "true", "yes", "0", ""] {
        studentbox(&home)
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success();
    }
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = studentbox(&home())
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(doc["version"], env!("CARGO_PKG_VERSION"));
}

// --- Runtimes ---

#[test]
fn test_runtimes_lists_builtin_lamp() {
    studentbox(&home())
        .arg("runtimes")
        .assert()
        .success()
        .stdout(predicate::str::contains("lamp"))
        .stdout(predicate::str::contains("lamp.db"));
}

#[test]
fn test_runtimes_json_shape() {
    let output = studentbox(&home())
        .args(["runtimes", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(doc["lamp"]["ports"], serde_json::json!([80]));
    assert!(doc["lamp"]["images"]["web"].is_string());
    assert!(doc["lamp"]["images"]["db"].is_string());
}

// --- Argument validation ---

#[test]
fn test_status_requires_user_and_project() {
    studentbox(&home())
        .args(["status", "-p", "blog"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_spawn_requires_runtime() {
    studentbox(&home())
        .args(["spawn", "-u", "alice", "-p", "blog"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--runtime"));
}

#[test]
fn test_envs_help_lists_filters() {
    studentbox(&home())
        .args(["envs", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--container").and(predicate::str::contains("--query")));
}

// --- Early failures (no daemon call is reached) ---

#[test]
fn test_relative_host_path_is_rejected() {
    studentbox(&home())
        .args(["list", "--hostpath", "relative/dir"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("host path must be an absolute path"));
}

#[test]
fn test_relative_host_path_json_error_code() {
    let output = studentbox(&home())
        .args(["list", "--json", "--hostpath", "relative/dir"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(doc["error"], true);
    assert_eq!(doc["code"], "configuration");
}

#[test]
fn test_spawn_rejects_malformed_env() {
    let home = home();
    let host = home.path().display().to_string();
    let data = home.path().join("data").display().to_string();
    studentbox(&home)
        .args(["spawn", "-u", "alice", "-p", "blog", "-r", "lamp", "-e", "NOVALUE"])
        .args(["--hostpath", &host, "--datapath", &data])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid environment variable NOVALUE"));
}

#[test]
fn test_spawn_unknown_runtime_json_error_code() {
    let home = home();
    let host = home.path().display().to_string();
    let data = home.path().join("data").display().to_string();
    let output = studentbox(&home)
        .args(["spawn", "-u", "alice", "-p", "blog", "-r", "nope", "--json"])
        .args(["--hostpath", &host, "--datapath", &data])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(doc["code"], "runtime_not_found");
}
