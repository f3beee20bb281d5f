use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::auth::credential::CredentialPair;
use crate::auth::store::CredentialStore;
use crate::error::RagchatError;

/// The stored pair together with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub pair: Option<CredentialPair>,
    pub generation: u64,
}

/// Credential store plus a generation counter bumped on every write.
///
/// Reads and writes take the same lock, so a snapshot's pair and generation
/// always belong together.
#[derive(Debug)]
pub struct SessionCredentials {
    store: Box<dyn CredentialStore>,
    generation: Mutex<u64>,
}

impl SessionCredentials {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            store,
            generation: Mutex::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CredentialSnapshot {
        let generation = self.lock();
        CredentialSnapshot {
            pair: self.store.load(),
            generation: *generation,
        }
    }

    pub fn generation(&self) -> u64 {
        *self.lock()
    }

    /// Persist `pair` as the whole new credential state.
    pub fn replace(&self, pair: &CredentialPair) -> Result<u64, RagchatError> {
        let mut generation = self.lock();
        self.store.save(pair)?;
        *generation += 1;
        Ok(*generation)
    }

    pub fn clear(&self) -> Result<u64, RagchatError> {
        let mut generation = self.lock();
        self.store.clear()?;
        *generation += 1;
        Ok(*generation)
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let _generation = self.lock();
        self.store.saved_at()
    }
}
