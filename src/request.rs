use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::RagchatError;

/// Everything needed to (re)send a request.
///
/// Descriptors own their body so that a request blocked behind a credential
/// refresh can be replayed verbatim once the refresh settles.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    id: Uuid,
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Identifier used to correlate log lines for one logical request,
    /// including its replay.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, RagchatError> {
        let value = serde_json::to_value(body).map_err(|e| {
            RagchatError::InvalidRequest(format!("Failed to serialize request body: {e}"))
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
}

#[derive(Clone)]
pub enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content: Vec<u8>,
        mime: Option<String>,
    },
}

impl std::fmt::Debug for MultipartPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultipartPart::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            MultipartPart::File {
                name,
                file_name,
                content,
                mime,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("len", &content.len())
                .field("mime", mime)
                .finish(),
        }
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RagchatError> {
        serde_json::from_str(&self.body).map_err(|e| {
            RagchatError::ProtocolError(format!("Failed to parse response body: {e}"))
        })
    }
}
