pub mod http_mock;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ragchat::{ApiClient, CredentialStore, ReqwestTransport};
use wiremock::MockServer;

/// Base URL of the mock API.
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api/", server.uri())
}

/// Build a client against the mock server with the given store.
#[allow(dead_code)]
pub fn client_for(server: &MockServer, store: Box<dyn CredentialStore>) -> ApiClient {
    let transport = ReqwestTransport::new(&api_base(server), Duration::from_secs(10), true)
        .expect("mock server URL should be valid");
    ApiClient::with_parts(Arc::new(transport), store, "test")
}

/// Write a ragchat.json pointing at the mock server, keeping credentials in
/// `dir`.
#[allow(dead_code)]
pub fn write_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let config_path = dir.join("ragchat.json");
    let config = serde_json::json!({
        "baseUrl": api_base(server),
        "session": "cli-test",
        "timeoutSecs": 10,
        "credentialsPath": dir.join("credentials.json"),
    });
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    config_path
}

/// Bearer credentials seen by the server for requests to `path`, in arrival order.
#[allow(dead_code)]
pub async fn bearers_for(server: &MockServer, path: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .map(|r| {
            r.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_start_matches("Bearer ").to_string())
        })
        .collect()
}
