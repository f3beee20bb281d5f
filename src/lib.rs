pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod transport;
pub mod transports;
pub mod types;

pub use auth::{CredentialPair, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use client::ApiClient;
pub use config::{load_config, RagchatConfig};
pub use error::RagchatError;
pub use request::{ApiResponse, MultipartPart, RequestBody, RequestDescriptor};
pub use transport::HttpTransport;
pub use transports::ReqwestTransport;
pub use types::{Document, QueryRequest, QueryResponse, User};

