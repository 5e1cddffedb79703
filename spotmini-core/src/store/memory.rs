//! In-memory credential store implementation.

use async_trait::async_trait;
use std::sync::RwLock;

use super::{StoreError, TokenStore};
use crate::credential::Credential;

/// In-memory credential store for testing and development.
///
/// This store is not persistent; data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryTokenStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Credential, StoreError> {
        let credential = self.credential.read().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;

        credential.clone().ok_or_else(|| StoreError::NotFound {
            location: "memory".to_string(),
        })
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut slot = self.credential.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;

        *slot = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.credential.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;

        *slot = None;
        Ok(())
    }
}
