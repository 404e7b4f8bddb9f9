//! CLI structure, argument parsing, and the read-only commands.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

pub fn sl_inject() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sl-inject"));
    cmd.env("NO_COLOR", "1")
        .env_remove("VCAP_SERVICES")
        .env_remove("BUILD_DIR")
        .env_remove("BUILDPACK_VERSION")
        .env_remove("RUST_LOG");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    sl_inject()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Sealights agent"));
}

#[test]
fn test_cli_help_lists_commands() {
    sl_inject()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version_command_shows_version() {
    sl_inject()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sl-inject 0.1.0"));
}

#[test]
fn test_version_command_json() {
    sl_inject()
        .args(["version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"version":"0.1.0"}"#));
}

#[test]
fn test_run_requires_build_dir() {
    sl_inject()
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--build-dir"));
}

#[test]
fn test_run_rejects_unknown_format() {
    sl_inject()
        .args(["run", "--build-dir", ".", "--launch-file", "start.yml", "--format", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown launch format"));
}

// --- resolve ---

#[test]
fn test_resolve_without_binding_is_not_configured() {
    sl_inject()
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("not configured"));
}

#[test]
fn test_resolve_json_redacts_secrets() {
    let doc = r#"{"user-provided":[{"name":"sealights","credentials":{"proxy":"http://p:3128","proxyPassword":"hunter2","cli":{"token":"secret-token","labId":"acme"}}}]}"#;
    let output = sl_inject()
        .args(["resolve", "--json", "--buildpack-version", "1.8.0"])
        .env("VCAP_SERVICES", doc)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("secret-token"), "got: {stdout}");
    assert!(!stdout.contains("hunter2"), "got: {stdout}");

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["configured"], true);
    assert_eq!(
        report["downloadUrl"],
        "https://acme.sealights.co/dotnetcore/sealights-dotnet-agent-latest.tar.gz"
    );
    assert_eq!(report["config"]["arguments"]["tools"], "sl-pcf-1.8.0");
    assert_eq!(report["config"]["verb"], "startBackgroundTestListener");
    let warnings = report["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1, "got: {warnings:?}");
}

#[test]
fn test_resolve_human_output() {
    let doc = r#"{"user-provided":[{"name":"sealights","credentials":{"version":"3.2.1","cli":{"token":"t"}}}]}"#;
    sl_inject()
        .args(["resolve", "--bindings", doc])
        .assert()
        .success()
        .stdout(predicate::str::contains("sealights-dotnet-agent-3.2.1.tar.gz"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("build session id").and(predicate::str::contains("Warning")));
}
