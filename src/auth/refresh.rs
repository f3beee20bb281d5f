use serde_json::json;

use crate::auth::credential::{CredentialPair, RefreshedTokens, TokenPairResponse};
use crate::error::RagchatError;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::transport::HttpTransport;

pub const TOKEN_PATH: &str = "auth/token/";
pub const REFRESH_PATH: &str = "auth/token/refresh/";

fn reject(resp: ApiResponse) -> RagchatError {
    RagchatError::RequestFailure {
        status: resp.status,
        body: resp.body,
    }
}

/// Exchange a username and password for a fresh credential pair.
///
/// Sent without a bearer credential.
pub async fn obtain_token_pair(
    transport: &dyn HttpTransport,
    username: &str,
    password: &str,
) -> Result<CredentialPair, RagchatError> {
    let request = RequestDescriptor::post(TOKEN_PATH)
        .with_json(&json!({ "username": username, "password": password }))?;
    let resp = transport.execute(&request, None).await?;
    if !resp.is_success() {
        return Err(reject(resp));
    }
    let tokens: TokenPairResponse = resp.json()?;
    Ok(tokens.into())
}

/// Exchange the refresh credential for a new pair.
///
/// The refresh credential is carried over unless the server rotates it.
pub async fn exchange_refresh_token(
    transport: &dyn HttpTransport,
    refresh_token: &str,
) -> Result<CredentialPair, RagchatError> {
    let request =
        RequestDescriptor::post(REFRESH_PATH).with_json(&json!({ "refresh": refresh_token }))?;
    let resp = transport.execute(&request, None).await?;
    if !resp.is_success() {
        return Err(reject(resp));
    }
    let tokens: RefreshedTokens = resp.json()?;
    Ok(tokens.into_pair(refresh_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::scripted::ScriptedTransport;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn refresh_carries_old_refresh_token() {
        let transport = ScriptedTransport::new(&[]).refresh_succeeds("tok2", None);
        let pair = exchange_refresh_token(&transport, "r1").await.unwrap();
        assert_eq!(pair, CredentialPair::new("tok2", "r1"));
    }

    #[tokio::test]
    async fn refresh_takes_rotated_refresh_token() {
        let transport = ScriptedTransport::new(&[]).refresh_succeeds("tok2", Some("r2"));
        let pair = exchange_refresh_token(&transport, "r1").await.unwrap();
        assert_eq!(pair, CredentialPair::new("tok2", "r2"));
    }

    #[tokio::test]
    async fn refresh_sent_without_bearer() {
        let transport = ScriptedTransport::new(&[]).refresh_succeeds("tok2", None);
        exchange_refresh_token(&transport, "r1").await.unwrap();
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, REFRESH_PATH);
        assert!(calls[0].bearer.is_none());
    }

    #[tokio::test]
    async fn rejected_refresh_is_request_failure() {
        let transport = ScriptedTransport::new(&[]);
        let err = exchange_refresh_token(&transport, "r1").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn network_error_is_propagated() {
        let transport = ScriptedTransport::new(&[]).refresh_network_error();
        let err = exchange_refresh_token(&transport, "r1").await.unwrap_err();
        assert!(matches!(err, RagchatError::NetworkFailure(_)));
    }
}
