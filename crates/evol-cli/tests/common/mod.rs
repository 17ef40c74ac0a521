//! Shared test utilities for evol-cli integration tests.

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a Command for the evol binary, isolated from the caller's
/// configuration and environment.
///
/// # Panics
///
/// Panics if the evol binary cannot be found.
#[allow(deprecated)]
pub fn evol_cmd() -> Command {
    let mut cmd = Command::cargo_bin("evol").expect("evol binary should exist");
    let missing_config = std::env::temp_dir().join("evol-cli-tests-no-config.yaml");
    cmd.env("EVOL_CONFIG", missing_config)
        .env("EVOL_COLOR", "never")
        .env_remove("EVOL_PROVIDER")
        .env_remove("EVOL_MODEL")
        .env_remove("EVOL_ENDPOINT")
        .env_remove("EVOL_VERBOSE")
        .env_remove("EVOL_QUIET")
        .env_remove("OPENAI_API_KEY");
    cmd
}

/// `evol_cmd()` pointed at an Ollama-compatible server.
pub fn evol_with_ollama(server: &MockServer) -> Command {
    let mut cmd = evol_cmd();
    cmd.args(["--provider", "ollama", "--model", "test-model", "--endpoint"])
        .arg(server.uri());
    cmd
}

/// Start a server that answers every `/api/generate` call with `reply`.
pub async fn ollama_replying(reply: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": reply,
            "eval_count": 24
        })))
        .mount(&server)
        .await;
    server
}

/// Start a server whose `/api/generate` always fails with a 500.
pub async fn ollama_failing() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;
    server
}

/// Number of requests the server has seen.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

/// Write a request body with the given document contents.
pub fn write_request(dir: &Path, contents: &[&str], target: Option<i64>) -> std::path::PathBuf {
    let documents: Vec<Value> = contents
        .iter()
        .enumerate()
        .map(|(i, c)| json!({ "content": c, "metadata": { "source": format!("doc{}.pdf", i + 1) } }))
        .collect();
    let mut body = json!({ "documents": documents });
    if let Some(target) = target {
        body["target_questions"] = json!(target);
    }
    let path = dir.join("request.json");
    std::fs::write(&path, body.to_string()).expect("write request");
    path
}

/// Parse stdout as JSON.
pub fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}
