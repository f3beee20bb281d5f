use std::sync::Arc;

use reqwest::StatusCode;

use crate::auth::session::SessionCredentials;
use crate::error::RagchatError;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::transport::HttpTransport;

/// Outcome of a single dispatch that did not produce a 2xx response.
#[derive(Debug)]
pub enum DispatchError {
    /// The server answered 401. `generation` is the credential generation
    /// that was attached to the request.
    ExpiredCredential { generation: u64 },
    Failed(RagchatError),
}

impl From<RagchatError> for DispatchError {
    fn from(err: RagchatError) -> Self {
        DispatchError::Failed(err)
    }
}

/// Attaches the current access credential and classifies the response.
///
/// Never retries; expiry handling belongs to the refresh coordinator.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<SessionCredentials>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<SessionCredentials>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    pub fn credentials(&self) -> &Arc<SessionCredentials> {
        &self.credentials
    }

    pub async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, DispatchError> {
        let snapshot = self.credentials.snapshot();
        let bearer = snapshot.pair.as_ref().map(|pair| pair.access());
        tracing::debug!(
            request_id = %request.id(),
            method = %request.method,
            path = %request.path,
            authenticated = bearer.is_some(),
            generation = snapshot.generation,
            "dispatching request"
        );

        let response = self.transport.execute(request, bearer).await?;
        classify(response, snapshot.generation)
    }
}

fn classify(response: ApiResponse, generation: u64) -> Result<ApiResponse, DispatchError> {
    if response.status == StatusCode::UNAUTHORIZED {
        return Err(DispatchError::ExpiredCredential { generation });
    }
    if !response.is_success() {
        return Err(DispatchError::Failed(RagchatError::RequestFailure {
            status: response.status,
            body: response.body,
        }));
    }
    Ok(response)
}
