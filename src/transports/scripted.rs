//! In-process transport for exercising the dispatcher and refresh protocol
//! without a network.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::auth::refresh::REFRESH_PATH;
use crate::error::RagchatError;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::transport::HttpTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub path: String,
    pub bearer: Option<String>,
    pub request_id: Uuid,
}

enum RefreshReply {
    Respond(ApiResponse),
    NetworkError,
}

/// Accepts bearers in `valid_tokens` (200, body echoes the path) and
/// answers everything else with 401. The refresh endpoint replies with the
/// scripted refresh response, optionally after waiting on a gate.
pub(crate) struct ScriptedTransport {
    calls: Mutex<Vec<RecordedCall>>,
    valid_tokens: Mutex<HashSet<String>>,
    refresh_reply: Mutex<RefreshReply>,
    refresh_gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    pub fn new(valid: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            valid_tokens: Mutex::new(valid.iter().map(|t| t.to_string()).collect()),
            refresh_reply: Mutex::new(RefreshReply::Respond(ApiResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"detail":"Token is invalid or expired"}"#,
            ))),
            refresh_gate: None,
        }
    }

    /// Refresh succeeds with the given body; tokens it issues become valid.
    pub fn refresh_succeeds(self, access: &str, refresh: Option<&str>) -> Self {
        let body = match refresh {
            Some(r) => serde_json::json!({ "access": access, "refresh": r }),
            None => serde_json::json!({ "access": access }),
        };
        *self.refresh_reply.lock().unwrap() =
            RefreshReply::Respond(ApiResponse::new(StatusCode::OK, body.to_string()));
        self.valid_tokens.lock().unwrap().insert(access.to_string());
        self
    }

    /// Refresh succeeds but the issued token is still rejected upstream.
    pub fn refresh_issues_rejected(self, access: &str) -> Self {
        let body = serde_json::json!({ "access": access });
        *self.refresh_reply.lock().unwrap() =
            RefreshReply::Respond(ApiResponse::new(StatusCode::OK, body.to_string()));
        self
    }

    pub fn refresh_network_error(self) -> Self {
        *self.refresh_reply.lock().unwrap() = RefreshReply::NetworkError;
        self
    }

    pub fn with_refresh_gate(mut self, gate: Arc<Notify>) -> Self {
        self.refresh_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.path == REFRESH_PATH)
            .count()
    }

    /// Calls other than the refresh exchange, in the order they were sent.
    pub fn api_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path != REFRESH_PATH)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, RagchatError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: request.path.clone(),
            bearer: bearer.map(str::to_string),
            request_id: request.id(),
        });

        if request.path == REFRESH_PATH {
            if let Some(gate) = &self.refresh_gate {
                gate.notified().await;
            }
            return match &*self.refresh_reply.lock().unwrap() {
                RefreshReply::Respond(resp) => Ok(resp.clone()),
                RefreshReply::NetworkError => {
                    Err(RagchatError::NetworkFailure("connection reset".into()))
                }
            };
        }

        if request.path == "missing/" {
            return Ok(ApiResponse::new(StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#));
        }

        let accepted = bearer
            .map(|b| self.valid_tokens.lock().unwrap().contains(b))
            .unwrap_or(false);
        if accepted {
            let body = serde_json::json!({ "path": request.path });
            Ok(ApiResponse::new(StatusCode::OK, body.to_string()))
        } else {
            Ok(ApiResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"detail":"Given token not valid for any token type"}"#,
            ))
        }
    }
}
