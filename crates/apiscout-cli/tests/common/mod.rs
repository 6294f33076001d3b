#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Env var the test config points the analyzer at.
#[allow(dead_code)]
pub const TEST_KEY_ENV: &str = "APISCOUT_TEST_API_KEY";

/// Create a configured `apiscout` command suitable for integration tests.
///
/// The config location points into `home`, so no user config leaks in.
#[allow(dead_code)]
pub fn apiscout_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("apiscout"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("APISCOUT_CONFIG", home.join("config.toml"));
    cmd.env_remove("ANTHROPIC_API_KEY");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write a config file whose analyzer talks to `server`.
#[allow(dead_code)]
pub fn write_config(home: &TempDir, server: &MockServer, chunk_size: usize) {
    let config = format!(
        "[extraction]\nchunk_size = {chunk_size}\nmax_workers = 2\nchunk_timeout_secs = 10\n\n\
         [analyzer]\nbase_url = \"{}\"\napi_key_env = \"{TEST_KEY_ENV}\"\n\
         min_call_interval_ms = 0\n",
        server.uri()
    );
    std::fs::write(home.path().join("config.toml"), config).expect("write config");
}

/// Serve a two-page documentation site: an index linking to a Pets page
/// that documents three endpoints.
#[allow(dead_code)]
pub async fn mount_docs_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Petstore API</title></head><body>
               <p>Welcome to the Petstore API documentation.</p>
               <a href="/docs/pets">Pets</a>
               <a href="/blog/launch">Blog</a>
               </body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/pets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r"<html><head><title>Pets | Petstore</title></head><body>
               <h1>Pets</h1>
               <p>Everything about your pets.</p>
               <h2>GET /pets</h2><p>List pets.</p>
               <h2>POST /pets/search</h2><p>Search pets.</p>
               <h2>GET /pets/{petId}</h2><p>Fetch one pet.</p>
               </body></html>",
        ))
        .mount(server)
        .await;
}

/// A Messages API reply whose text is `extraction` as JSON.
#[allow(dead_code)]
pub fn messages_reply(extraction: &serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{
            "type": "text",
            "text": format!("```json\n{extraction}\n```"),
        }],
    }))
}
