use serde::{Deserialize, Serialize};

/// Access/refresh credential pair.
///
/// Immutable: a new pair always replaces the previous one as a whole.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    access: String,
    refresh: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn access(&self) -> &str {
        &self.access
    }

    pub fn refresh(&self) -> &str {
        &self.refresh
    }
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Body of a successful login (`auth/token/`).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

impl From<TokenPairResponse> for CredentialPair {
    fn from(resp: TokenPairResponse) -> Self {
        CredentialPair::new(resp.access, resp.refresh)
    }
}

/// Body of a successful refresh. Servers that rotate refresh tokens also
/// return a new `refresh`.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshedTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl RefreshedTokens {
    /// Build the successor pair, carrying the old refresh token over when
    /// the server did not rotate it.
    pub fn into_pair(self, previous_refresh: &str) -> CredentialPair {
        let refresh = self
            .refresh
            .unwrap_or_else(|| previous_refresh.to_string());
        CredentialPair::new(self.access, refresh)
    }
}
