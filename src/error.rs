use std::path::PathBuf;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RagchatError {
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailure { status: StatusCode, body: String },

    #[error("Session expired. Run: ragchat login")]
    AuthenticationExpired,

    #[error("Network error: {0}")]
    NetworkFailure(Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Credential storage error: {0}")]
    StorageError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RagchatError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            RagchatError::RequestFailure { .. } => "request_failed",
            RagchatError::AuthenticationExpired => "auth_expired",
            RagchatError::NetworkFailure(_) => "network_error",
            RagchatError::InvalidRequest(_) => "invalid_request",
            RagchatError::ProtocolError(_) => "parse_error",
            RagchatError::ConfigError { .. } => "config_error",
            RagchatError::StorageError(_) => "storage_error",
            RagchatError::IoError(_) => "io_error",
        }
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RagchatError::RequestFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller must send the user back through login.
    pub fn requires_login(&self) -> bool {
        matches!(self, RagchatError::AuthenticationExpired)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(status) = self.status() {
            obj.insert("status".into(), serde_json::Value::from(status.as_u16()));
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}
