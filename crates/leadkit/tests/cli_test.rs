//! Integration tests for the `leadkit` CLI binary.
//!
//! Argument parsing, help, completions and error mapping run without a
//! backend; the session tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `leadkit` binary with env isolation.
///
/// Clears `LEADKIT_*` and `XDG_*` vars and points `HOME` at `home`, so
/// config and session files land in a throwaway directory.
fn leadkit_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("leadkit");
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("LEADKIT_PROFILE")
        .env_remove("LEADKIT_API_URL")
        .env_remove("LEADKIT_OUTPUT")
        .env_remove("LEADKIT_TIMEOUT")
        .env_remove("LEADKIT_PASSWORD")
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-cli",
            "user": { "id": "u1", "email": "ada@example.com", "name": "Ada" }
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = leadkit_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("websites")
            .and(predicate::str::contains("forms"))
            .and(predicate::str::contains("leads"))
            .and(predicate::str::contains("analytics")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("leadkit"));
}

#[test]
fn test_subcommand_help() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .args(["forms", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("detect").and(predicate::str::contains("snippet")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_generate_for_common_shells() {
    let home = tempfile::tempdir().unwrap();
    for shell in ["bash", "zsh", "fish"] {
        leadkit_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

// ── Usage errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .args(["-o", "xml", "websites", "list"])
        .assert()
        .code(2);
}

#[test]
fn test_analytics_days_out_of_range() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .args(["analytics", "--days", "0"])
        .assert()
        .code(2);
}

// ── Session gate ────────────────────────────────────────────────────

#[test]
fn test_websites_list_requires_login() {
    let home = tempfile::tempdir().unwrap();
    let output = leadkit_cmd(home.path())
        .args(["websites", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(text.contains("Not logged in"), "Unexpected output:\n{text}");
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let output = leadkit_cmd(home.path())
        .args(["--profile", "staging", "websites", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("staging"), "Unexpected output:\n{text}");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_into_home() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .args(["config", "set", "api_url", "https://leads.example.com"])
        .assert()
        .success();

    leadkit_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("https://leads.example.com")),
        );

    leadkit_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_session_for_later_commands() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .and(header("authorization", "Bearer tok-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "websites": [{ "id": "w1", "url": "https://x.com", "name": "X", "forms": [] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .env("LEADKIT_PASSWORD", "hunter2")
        .args(["--api-url", &server.uri(), "auth", "login", "--email", "ada@example.com"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged in as ada@example.com"));

    leadkit_cmd(home.path())
        .args(["--api-url", &server.uri(), "-o", "plain", "websites", "list"])
        .assert()
        .success()
        .stdout("w1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .env("LEADKIT_PASSWORD", "wrong")
        .args(["--api-url", &server.uri(), "auth", "login", "--email", "ada@example.com"])
        .assert()
        .code(3);

    leadkit_cmd(home.path())
        .args(["auth", "whoami"])
        .assert()
        .code(3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_yes_in_pipe_is_refused() {
    let server = MockServer::start().await;
    mock_login(&server).await;

    let home = tempfile::tempdir().unwrap();
    leadkit_cmd(home.path())
        .env("LEADKIT_PASSWORD", "hunter2")
        .args(["--api-url", &server.uri(), "auth", "login", "--email", "ada@example.com"])
        .assert()
        .success();

    let output = leadkit_cmd(home.path())
        .args(["--api-url", &server.uri(), "websites", "delete", "w1"])
        .write_stdin("")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("--yes"), "Unexpected output:\n{text}");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "DELETE"));
}
