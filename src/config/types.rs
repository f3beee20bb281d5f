use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::store::session_path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";
pub const DEFAULT_SESSION: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagchatConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_session")]
    pub session: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the per-session credentials file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for RagchatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session: default_session(),
            timeout_secs: default_timeout_secs(),
            credentials_path: None,
            allow_http: false,
        }
    }
}

impl RagchatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| session_path(&self.session))
    }
}
