//! JSON file credential store.
//!
//! The credential lives at `~/.config/spotmini/token.json` on Linux and the
//! platform equivalent elsewhere.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{StoreError, TokenStore};
use crate::credential::Credential;

/// Disk-backed credential store.
///
/// Writes overwrite the file in full. A torn write only costs a fresh login,
/// so no temp-file dance is done here.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Open the store at a specific path, creating parent directories.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Get the storage path for this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Credential, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    location: self.path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&contents)?)
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(credential)?;
        tokio::fs::write(&self.path, contents).await?;

        tracing::debug!("Saved credential to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
