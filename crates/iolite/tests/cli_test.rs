//! Integration tests for the `iolite` CLI binary.
//!
//! These tests validate argument parsing, help output, shell
//! completions, pairing decode, and error handling — all without a
//! live gateway.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `iolite` binary with env isolation.
///
/// Clears all `IOLITE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real
/// configuration.
fn iolite_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("iolite");
    cmd.env("HOME", "/tmp/iolite-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/iolite-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/iolite-cli-test-nonexistent")
        .env_remove("IOLITE_PROFILE")
        .env_remove("IOLITE_HOST")
        .env_remove("IOLITE_OUTPUT")
        .env_remove("IOLITE_USERNAME")
        .env_remove("IOLITE_PASSWORD")
        .env_remove("IOLITE_CODE");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = iolite_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    iolite_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("IOLITE")
            .and(predicate::str::contains("pair"))
            .and(predicate::str::contains("discover"))
            .and(predicate::str::contains("schedule")),
    );
}

#[test]
fn test_version_flag() {
    iolite_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("iolite"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    iolite_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    iolite_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Pairing decode (offline) ────────────────────────────────────────

#[test]
fn test_pair_decodes_qr_payload() {
    // dXNlcjpwYXNz == base64("user:pass")
    let qr = r#"{"webApp": "/ui", "code": "abc123", "basicAuth": "dXNlcjpwYXNz"}"#;
    iolite_cmd().args(["pair", qr]).assert().success().stdout(
        predicate::str::contains("CODE=abc123")
            .and(predicate::str::contains("HTTP_USERNAME=user"))
            .and(predicate::str::contains("HTTP_PASSWORD=pass")),
    );
}

#[test]
fn test_pair_rejects_malformed_payload() {
    let output = iolite_cmd().args(["pair", "not json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(text.contains("qr"), "Expected error naming the qr field:\n{text}");
}

#[test]
fn test_pair_rejects_missing_code() {
    let qr = r#"{"basicAuth": "dXNlcjpwYXNz"}"#;
    iolite_cmd().args(["pair", qr]).assert().failure();
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = iolite_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_sid_without_credentials_fails_with_auth_code() {
    let output = iolite_cmd().arg("sid").output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("credentials") || text.contains("profile"),
        "Expected missing-credentials error:\n{text}"
    );
}

#[test]
fn test_discover_without_credentials_fails() {
    iolite_cmd().arg("discover").assert().failure();
}

#[test]
fn test_set_temp_requires_both_arguments() {
    let output = iolite_cmd().args(["set-temp", "device-1"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
}

#[test]
fn test_schedule_add_rejects_invalid_day() {
    iolite_cmd()
        .args(["schedule", "add", "Kitchen", "someday", "14", "30", "90"])
        .assert()
        .failure();
}
