//! CLI regression tests for the `covenant` binary.
//!
//! These run the binary as a subprocess against a mocked service, covering
//! flag names, exit codes and output formats.
//!
//! Requires the `covenant` binary to be built first (`cargo build -p covenant`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn covenant() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("covenant").expect("covenant binary not found; run `cargo build -p covenant` first")
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

async fn service() -> MockServer {
    let server = MockServer::start().await;
    let spec = std::fs::read_to_string(fixtures().join("calendar-api.json")).unwrap();

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2024-12-01T09:00:00.000Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(spec, "application/json"))
        .mount(&server)
        .await;

    server
}

fn body_file(dir: &TempDir, body: serde_json::Value) -> PathBuf {
    let file = dir.path().join("body.json");
    std::fs::write(&file, body.to_string()).unwrap();
    file
}

// ---------------------------------------------------------------------------
// covenant inspect
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn inspect_lists_operations() {
    let server = service().await;

    covenant()
        .args(["inspect", "--server-url", &server.uri()])
        .assert()
        .success()
        .stdout(contains("Calendar App API v1.0.0 (OpenAPI 3.0.3)"))
        .stdout(contains("/api/events (createCalendarEvent) [201, 400]"));
}

#[tokio::test(flavor = "multi_thread")]
async fn inspect_reads_server_url_from_env() {
    let server = service().await;

    covenant()
        .arg("inspect")
        .env("COVENANT_SERVER_URL", server.uri())
        .assert()
        .success()
        .stdout(contains("getHealthStatus"));
}

#[tokio::test(flavor = "multi_thread")]
async fn inspect_reads_config_file() {
    let server = service().await;
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("covenant.yaml");
    std::fs::write(&config, format!("serverUrl: {}\ntimeout: 2000\n", server.uri())).unwrap();

    covenant()
        .args(["inspect", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("deleteCalendarEvent"));
}

#[test]
fn inspect_unreachable_service_exits_one() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    covenant()
        .args(["inspect", "--server-url", &format!("http://127.0.0.1:{port}")])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("cannot connect"));
}

// ---------------------------------------------------------------------------
// covenant validate
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn validate_matching_response_exits_zero() {
    let server = service().await;
    let dir = TempDir::new().unwrap();
    let body = body_file(
        &dir,
        json!({"status": "healthy", "timestamp": "2024-12-01T09:00:00.000Z"}),
    );

    covenant()
        .args(["validate", "--server-url", &server.uri()])
        .args(["--path", "/health", "--method", "get", "--status", "200", "--body"])
        .arg(&body)
        .assert()
        .success()
        .stdout(contains("ok: GET /health (200) matches its schema"));
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_mismatch_exits_one_with_details() {
    let server = service().await;
    let dir = TempDir::new().unwrap();
    let body = body_file(&dir, json!({"status": "healthy"}));

    covenant()
        .args(["validate", "--server-url", &server.uri()])
        .args(["--path", "/health", "--method", "get", "--status", "200", "--body"])
        .arg(&body)
        .assert()
        .failure()
        .code(1)
        .stdout(contains("mismatch: GET /health (200)"))
        .stdout(contains("  - root: "));
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_request_body_from_stdin() {
    let server = service().await;

    covenant()
        .args(["validate", "--server-url", &server.uri()])
        .args(["--path", "/api/events", "--method", "post", "--body", "-"])
        .write_stdin(r#"{"title": ""}"#)
        .assert()
        .failure()
        .code(1)
        .stdout(contains("mismatch: POST /api/events request"));
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_json_format_outputs_verdict() {
    let server = service().await;
    let dir = TempDir::new().unwrap();
    let body = body_file(&dir, json!({"error": "Event not found"}));

    let output = covenant()
        .args(["validate", "--server-url", &server.uri()])
        .args(["--path", "/api/events/{id}", "--method", "delete", "--status", "404"])
        .args(["--format", "json", "--body"])
        .arg(&body)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let verdict: serde_json::Value =
        serde_json::from_slice(&output).expect("--format json output should be valid JSON");
    assert_eq!(verdict["valid"], true);
    assert!(verdict.get("schemaUsed").is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_undocumented_operation_exits_one() {
    let server = service().await;
    let dir = TempDir::new().unwrap();
    let body = body_file(&dir, json!({}));

    covenant()
        .args(["validate", "--server-url", &server.uri()])
        .args(["--path", "/nope", "--method", "get", "--status", "200", "--body"])
        .arg(&body)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("operation not found for GET /nope"));
}

#[test]
fn validate_missing_body_file_exits_one() {
    covenant()
        .args(["validate", "--path", "/health", "--method", "get"])
        .args(["--body", "this-file-does-not-exist.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to read body"));
}

#[test]
fn unknown_log_format_exits_one() {
    covenant()
        .args(["--log-format", "xml", "inspect"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("unknown log format"));
}
