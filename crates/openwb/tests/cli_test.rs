//! Integration tests for the `openwb` CLI binary.
//!
//! Argument parsing, config handling and error exit codes run offline;
//! polling runs against a `wiremock` stand-in for the wallbox.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `openwb` binary with env isolation.
///
/// Points config directories at a nonexistent path and clears `OPENWB_*`
/// so tests never touch the user's real configuration.
fn openwb_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("openwb");
    cmd.env("HOME", "/tmp/openwb-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/openwb-cli-test-nonexistent")
        .env_remove("OPENWB_CONFIG")
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("OPENWB_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Same as [`openwb_cmd`] with `--config` pointing into `dir`.
fn openwb_with_config(dir: &Path) -> assert_cmd::Command {
    let mut cmd = openwb_cmd();
    cmd.arg("--config").arg(dir.join("config.toml"));
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn status_body() -> Value {
    json!({
        "systemName": "Garage",
        "lademodus": "3",
        "soc": "76.5",
        "plugstatlp1": "1",
        "speichersoc": 40,
        "error": "none",
    })
}

async fn wallbox() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openWB/web/api.php"))
        .and(query_param("get", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = openwb_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    openwb_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("openWB")
            .and(predicate::str::contains("fetch"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    openwb_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("openwb"));
}

#[test]
fn test_invalid_output_format() {
    openwb_cmd()
        .args(["-o", "yaml", "fetch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("yaml"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let dir = tempfile::tempdir().unwrap();
    openwb_with_config(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_add_device_then_show() {
    let dir = tempfile::tempdir().unwrap();
    openwb_with_config(dir.path())
        .args([
            "config",
            "add-device",
            "garage",
            "--host",
            "192.168.1.168",
            "--label",
            "Garage wallbox",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Added device 'garage'"));

    let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(written.contains("[devices.garage]"), "{written}");

    openwb_with_config(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.1.168").and(predicate::str::contains("Garage wallbox")),
        );
}

#[test]
fn test_config_add_device_rejects_bad_timing() {
    let dir = tempfile::tempdir().unwrap();
    openwb_with_config(dir.path())
        .args([
            "config",
            "add-device",
            "garage",
            "--host",
            "wb",
            "--device-interval",
            "5",
        ])
        .assert()
        .code(2);
    assert!(!dir.path().join("config.toml").exists());
}

// ── Fetch: error cases ──────────────────────────────────────────────

#[test]
fn test_fetch_without_devices() {
    let dir = tempfile::tempdir().unwrap();
    let output = openwb_with_config(dir.path()).arg("fetch").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("No devices configured"), "{text}");
}

#[test]
fn test_fetch_unknown_device() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[devices.garage]\nhost = \"192.168.1.168\"\n",
    )
    .unwrap();

    let output = openwb_with_config(dir.path())
        .args(["fetch", "--device", "carport"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("carport") && text.contains("garage"), "{text}");
}

#[test]
fn test_timeout_not_below_interval_is_usage_error() {
    openwb_cmd()
        .args(["--timeout", "40", "fetch", "--host", "192.168.1.168"])
        .assert()
        .code(2);
}

#[test]
fn test_fetch_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let output = openwb_cmd()
        .args(["--timeout", "2", "fetch", "--host", &format!("127.0.0.1:{port}")])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut cmd = openwb_cmd();
    cmd.args(["fetch", "--host", &server.uri()]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("unusable response"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut cmd = openwb_cmd();
    cmd.args(["--timeout", "1", "fetch", "--host", &server.uri()]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(8), "{}", combined_output(&output));
}

// ── Fetch: output ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_plain_output() {
    let server = wallbox().await;

    let mut cmd = openwb_cmd();
    cmd.args(["-o", "plain", "fetch", "--host", &server.uri()]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("soc=76.5"), "{stdout}");
    assert!(stdout.contains("lademodus=Stop"), "{stdout}");
    assert!(stdout.contains("error=none"), "{stdout}");
    assert!(stdout.contains("speichersoc=40"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_json_output() {
    let server = wallbox().await;

    let mut cmd = openwb_cmd();
    cmd.args(["-o", "json", "--language", "de", "fetch", "--host", &server.uri()]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["device"], "Garage");
    assert_eq!(report["available"], true);

    let metrics = report["metrics"].as_array().unwrap();
    let find = |key: &str| metrics.iter().find(|m| m["key"] == key).unwrap().clone();
    assert_eq!(find("soc")["value"], json!(76.5));
    assert_eq!(find("plugstatlp1")["value"], json!(1));
    assert_eq!(find("error")["value"], json!("none"));
    assert_eq!(find("lademodus")["display"], json!("Stop"));
    assert_eq!(find("speichersoc")["name"], json!("Speicher Ladestand"));
    assert_eq!(find("speichersoc")["unit"], json!("%"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_configured_device() {
    let server = wallbox().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        format!(
            "[devices.garage]\nhost = \"{}\"\nname = \"Carport\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let mut cmd = openwb_with_config(dir.path());
    cmd.args(["-o", "json-compact", "fetch"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["device"], "Carport");
}

// ── Watch ───────────────────────────────────────────────────────────

#[test]
fn test_watch_rejects_zero_count() {
    openwb_cmd()
        .args(["watch", "--host", "192.168.1.168", "--count", "0"])
        .timeout(Duration::from_secs(10))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--count"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_prints_each_update() {
    let server = wallbox().await;

    let mut cmd = openwb_cmd();
    cmd.args([
        "-o",
        "plain",
        "--interval",
        "1",
        "--timeout",
        "0",
        "watch",
        "--host",
        &server.uri(),
        "--count",
        "2",
    ]);
    let output = run(cmd).await;

    // A zero timeout is rejected before polling starts.
    assert_eq!(output.status.code(), Some(2));

    let mut cmd = openwb_cmd();
    cmd.args([
        "-o",
        "plain",
        "--interval",
        "2",
        "--timeout",
        "1",
        "watch",
        "--host",
        &server.uri(),
        "--count",
        "2",
    ])
    .timeout(Duration::from_secs(30));
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Garage soc=76.5").count(), 2, "{stdout}");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
