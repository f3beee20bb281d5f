pub mod coordinator;
pub mod credential;
pub mod refresh;
pub mod session;
pub mod store;

pub use coordinator::RefreshCoordinator;
pub use credential::CredentialPair;
pub use refresh::{exchange_refresh_token, obtain_token_pair};
pub use session::{CredentialSnapshot, SessionCredentials};
pub use store::{session_path, CredentialStore, FileCredentialStore, MemoryCredentialStore};
