use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REFRESH: &str = "/api/auth/token/refresh/";

fn token_invalid() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(serde_json::json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid"
    }))
}

/// `GET api_path` answers 401 for `expired` and `body` for `valid`.
#[allow(dead_code)]
pub async fn mount_protected_get(
    server: &MockServer,
    api_path: &str,
    expired: &str,
    valid: &str,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .and(header("Authorization", format!("Bearer {expired}").as_str()))
        .respond_with(token_invalid())
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path))
        .and(header("Authorization", format!("Bearer {valid}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// `GET api_path` answers 401 whatever the credential.
#[allow(dead_code)]
pub async fn mount_always_unauthorized(server: &MockServer, api_path: &str) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(token_invalid())
        .mount(server)
        .await;
}

/// Refresh endpoint issuing `access`, slow enough that concurrent requests
/// observe their 401 while it is outstanding. Must be hit `expected` times.
#[allow(dead_code)]
pub async fn mount_refresh_success(server: &MockServer, access: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access": access }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(expected)
        .named("token refresh")
        .mount(server)
        .await;
}

/// Refresh endpoint rejecting the refresh credential.
#[allow(dead_code)]
pub async fn mount_refresh_rejected(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_invalid().set_delay(Duration::from_millis(300)))
        .expect(expected)
        .named("token refresh")
        .mount(server)
        .await;
}
