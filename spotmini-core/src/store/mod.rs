//! Credential persistence.
//!
//! This module provides:
//! - [`TokenStore`] - Trait for loading and replacing the single stored credential
//! - [`FileTokenStore`] - JSON file in the per-user config directory
//! - [`MemoryTokenStore`] - In-memory implementation for testing
//!
//! Stores never cache: every `load` reads the backing medium so that a token
//! refreshed by another process is picked up immediately.

use async_trait::async_trait;
use thiserror::Error;

use crate::credential::Credential;

mod file;
mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credential has been stored yet.
    #[error("no stored credential at {location}")]
    NotFound { location: String },

    /// I/O error reading or writing the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },
}

/// Persistence for the one credential this application uses.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the stored credential.
    ///
    /// Returns [`StoreError::NotFound`] if nothing has been stored.
    async fn load(&self) -> Result<Credential, StoreError>;

    /// Replace the stored credential in full.
    async fn save(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Remove the stored credential. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    async fn load(&self) -> Result<Credential, StoreError> {
        (**self).load().await
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        (**self).save(credential).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}
