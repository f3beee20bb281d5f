use async_trait::async_trait;

use crate::error::RagchatError;
use crate::request::{ApiResponse, RequestDescriptor};

impl std::fmt::Debug for dyn HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request, attaching `bearer` as the `Authorization` credential
    /// when present.
    ///
    /// Any HTTP status is a successful return; only transport-level failures
    /// are errors.
    async fn execute(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, RagchatError>;
}
