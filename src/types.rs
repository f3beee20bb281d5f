use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RagchatError;

/// The authenticated account, as returned by `auth/me/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            format!("{full} ({})", self.username)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// Result of ingesting uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub chunks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: u32,
    pub generate: bool,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl QueryRequest {
    pub const DEFAULT_TOP_K: u32 = 4;
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: Self::DEFAULT_TOP_K,
            generate: true,
            temperature: Self::DEFAULT_TEMPERATURE,
            source: None,
        }
    }

    /// Reject values the server would refuse anyway.
    pub fn validate(&self) -> Result<(), RagchatError> {
        if self.query.trim().is_empty() {
            return Err(RagchatError::InvalidRequest("query must not be empty".into()));
        }
        if self.top_k < 1 {
            return Err(RagchatError::InvalidRequest("top_k must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagchatError::InvalidRequest(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// A retrieved chunk. `score` is a similarity in `[0, 1]`, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub index: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<RetrievedChunk>,
    /// Absent when the query was retrieval-only.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Local view of the stored session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session: String,
    pub authenticated: bool,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
