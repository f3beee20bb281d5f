use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::coordinator::RefreshCoordinator;
use crate::auth::refresh::obtain_token_pair;
use crate::auth::session::SessionCredentials;
use crate::auth::store::{CredentialStore, FileCredentialStore};
use crate::config::RagchatConfig;
use crate::dispatch::Dispatcher;
use crate::error::RagchatError;
use crate::request::{ApiResponse, MultipartPart, RequestDescriptor};
use crate::transport::HttpTransport;
use crate::transports::ReqwestTransport;
use crate::types::{
    Document, DocumentList, QueryRequest, QueryResponse, RegisterRequest, SessionStatus,
    UploadResponse, User,
};

/// Largest file the server will ingest.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Account fields echoed back by registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Client for the RAG chatbot API.
///
/// Every call goes through [`ApiClient::request`], which attaches the stored
/// bearer credential and recovers from expiry with a single shared refresh.
#[derive(Debug, Clone)]
pub struct ApiClient {
    coordinator: RefreshCoordinator,
    session: String,
}

impl ApiClient {
    pub fn from_config(config: &RagchatConfig) -> Result<Self, RagchatError> {
        let transport =
            ReqwestTransport::new(&config.base_url, config.timeout(), config.allow_http)?;
        let store = FileCredentialStore::at(config.credentials_path());
        Ok(Self::with_parts(
            Arc::new(transport),
            Box::new(store),
            &config.session,
        ))
    }

    pub fn with_parts(
        transport: Arc<dyn HttpTransport>,
        store: Box<dyn CredentialStore>,
        session: &str,
    ) -> Self {
        let credentials = Arc::new(SessionCredentials::new(store));
        let dispatcher = Dispatcher::new(transport, credentials);
        Self {
            coordinator: RefreshCoordinator::new(dispatcher),
            session: session.to_string(),
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send a request on behalf of a collaborator.
    ///
    /// Never surfaces an expired credential: the caller sees the response,
    /// a `RequestFailure`/`NetworkFailure`, or `AuthenticationExpired`.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, RagchatError> {
        self.coordinator.send(descriptor).await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, RagchatError> {
        self.request(descriptor).await?.json()
    }

    /// Obtain a credential pair for `username` and make it the session's.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), RagchatError> {
        let pair = obtain_token_pair(
            self.coordinator.dispatcher().transport(),
            username,
            password,
        )
        .await?;
        self.coordinator.establish(&pair)?;
        tracing::info!(username, session = %self.session, "logged in");
        Ok(())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser, RagchatError> {
        let descriptor = RequestDescriptor::post("auth/register/").with_json(request)?;
        self.request_json(descriptor).await
    }

    pub async fn me(&self) -> Result<User, RagchatError> {
        self.request_json(RequestDescriptor::get("auth/me/")).await
    }

    pub fn logout(&self) -> Result<(), RagchatError> {
        self.coordinator.end_session()
    }

    /// Upload files for ingestion, optionally tagged with a `source` label.
    pub async fn upload(
        &self,
        files: &[PathBuf],
        source: Option<&str>,
    ) -> Result<UploadResponse, RagchatError> {
        if files.is_empty() {
            return Err(RagchatError::InvalidRequest("no files to upload".into()));
        }
        let mut parts = Vec::with_capacity(files.len() + 1);
        for path in files {
            parts.push(read_file_part(path).await?);
        }
        if let Some(source) = source.filter(|s| !s.is_empty()) {
            parts.push(MultipartPart::Text {
                name: "source".into(),
                value: source.to_string(),
            });
        }
        let descriptor = RequestDescriptor::post("documents/upload/").with_multipart(parts);
        self.request_json(descriptor).await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, RagchatError> {
        request.validate()?;
        let descriptor = RequestDescriptor::post("query/").with_json(request)?;
        self.request_json(descriptor).await
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, RagchatError> {
        let list: DocumentList = self
            .request_json(RequestDescriptor::get("documents/"))
            .await?;
        Ok(list.documents)
    }

    pub async fn delete_document(&self, id: u64) -> Result<(), RagchatError> {
        self.request(RequestDescriptor::delete(format!("documents/{id}/")))
            .await?;
        Ok(())
    }

    pub fn session_status(&self) -> SessionStatus {
        let credentials = self.coordinator.dispatcher().credentials();
        SessionStatus {
            session: self.session.clone(),
            authenticated: credentials.snapshot().pair.is_some(),
            saved_at: credentials.saved_at(),
        }
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "txt" | "md" | "csv" | "log" => Some("text/plain"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

async fn read_file_part(path: &Path) -> Result<MultipartPart, RagchatError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        RagchatError::InvalidRequest(format!("Cannot read {}: {e}", path.display()))
    })?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(RagchatError::InvalidRequest(format!(
            "File {} exceeds {}MB limit.",
            path.display(),
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    let content = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(MultipartPart::File {
        name: "files".into(),
        file_name,
        content,
        mime: mime_for(path).map(str::to_string),
    })
}
