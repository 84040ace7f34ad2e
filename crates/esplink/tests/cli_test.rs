//! Integration tests for the `esplink` CLI binary.
//!
//! Argument parsing, config handling, and exit codes run against nothing or
//! against a wiremock gateway. No real device needed.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `esplink` binary with env isolation.
///
/// Clears all `ESPLINK_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn esplink_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("esplink");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("ESPLINK_PROFILE")
        .env_remove("ESPLINK_SERVER")
        .env_remove("ESPLINK_INTERVAL")
        .env_remove("ESPLINK_TIMEOUT")
        .env_remove("ESPLINK_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(home: &Path, args: Vec<String>) -> std::process::Output {
    let home = home.to_path_buf();
    tokio::task::spawn_blocking(move || esplink_cmd(&home).args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(server: &MockServer, rest: &[&str]) -> Vec<String> {
    let mut v = vec!["--server".to_owned(), format!("{}/api", server.uri())];
    v.extend(rest.iter().map(|s| (*s).to_owned()));
    v
}

async fn mount_healthy_gateway(server: &MockServer, output: bool) {
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "mqtt_connected": true, "system_status": "running", "io1_current_state": output }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/io1/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": { "state": output } })),
        )
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = esplink_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("ESP32")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("history")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("esplink"));
}

#[test]
fn test_completions_bash_and_zsh() {
    let home = tempfile::tempdir().unwrap();
    for shell in ["bash", "zsh"] {
        esplink_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("esplink"));
    }
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .arg("reboot")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_set_rejects_unknown_state() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .args(["set", "maybe"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_non_http_server_is_validation_error() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .args(["--server", "ftp://10.0.0.1/api", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("server_url"));
}

#[test]
fn test_unknown_profile_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .args(["--profile", "lab", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'lab' not found"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_is_under_config_home() {
    let home = tempfile::tempdir().unwrap();
    let output = esplink_cmd(home.path())
        .args(["config", "path"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim_end().ends_with("config.toml"), "{stdout}");
}

#[test]
fn test_config_init_then_show() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .args(["config", "init", "--name", "lab", "--url", "http://10.1.95.252:5000/api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved profile 'lab'"));

    let output = esplink_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let cfg: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        cfg["profiles"]["lab"]["server_url"],
        "http://10.1.95.252:5000/api"
    );
}

#[test]
fn test_config_init_refuses_overwrite_without_force() {
    let home = tempfile::tempdir().unwrap();
    let init = ["config", "init", "--url", "http://10.0.0.2/api"];
    esplink_cmd(home.path()).args(init).assert().success();
    esplink_cmd(home.path())
        .args(init)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
    esplink_cmd(home.path())
        .args(init)
        .arg("--force")
        .assert()
        .success();
}

// ── Gateway commands ────────────────────────────────────────────────

#[test]
fn test_unreachable_gateway_exits_with_connection_code() {
    let home = tempfile::tempdir().unwrap();
    esplink_cmd(home.path())
        .args(["--server", "http://127.0.0.1:9/api", "--timeout", "2", "status"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Could not reach the gateway"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json() {
    let server = MockServer::start().await;
    mount_healthy_gateway(&server, true).await;
    let home = tempfile::tempdir().unwrap();

    let output = run(home.path(), args(&server, &["status", "-o", "json"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let snap: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snap["connection"], "connected");
    assert_eq!(snap["device"]["device_running"], true);
    assert_eq!(snap["output"]["value"], true);
    assert_eq!(snap["output"]["provisional"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_reports_gateway_failure_in_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "mqtt_connected": false, "system_status": "stopped" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/io1/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "MQTT not connected" })),
        )
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(home.path(), args(&server, &["status"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Gateway link: down"), "{stdout}");
    assert!(stdout.contains("MQTT not connected"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_on_confirms() {
    let server = MockServer::start().await;
    mount_healthy_gateway(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/api/io1/control"))
        .and(body_json(json!({ "state": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "message": "IO1 set to ON" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(home.path(), args(&server, &["set", "on", "-o", "plain"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "on");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_refused_by_gateway_fails() {
    let server = MockServer::start().await;
    mount_healthy_gateway(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/api/io1/control"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "MQTT not connected" })),
        )
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(home.path(), args(&server, &["set", "on"])).await;
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Control failed"), "{text}");
    assert!(text.contains("MQTT not connected"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_while_device_stopped_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "mqtt_connected": true, "system_status": "stopped" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/io1/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": { "state": false } })),
        )
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(home.path(), args(&server, &["set", "on", "--wait", "1s"])).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_waits_for_device_to_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "mqtt_connected": true, "system_status": "stopped" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_healthy_gateway(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/api/io1/control"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "message": "IO1 set to ON" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(
        home.path(),
        args(&server, &["--interval", "1s", "set", "on", "--wait", "5s", "-o", "plain"]),
    )
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "on");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ad1/data"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "id": 7, "value": 1.25, "timestamp": "2026-10-17T08:00:00Z" },
                { "id": 8, "value": 3.5, "timestamp": "2026-10-17T08:00:05Z" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(
        home.path(),
        args(&server, &["history", "--limit", "2", "-o", "plain"]),
    )
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(lines, ["1.25", "3.5"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_probe_json_reports_round_trip() {
    let server = MockServer::start().await;
    mount_healthy_gateway(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = run(home.path(), args(&server, &["test", "-o", "json"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["reachable"], true);
    assert_eq!(report["liveness"], true);
    assert!(report["round_trip_ms"].is_u64());
}
