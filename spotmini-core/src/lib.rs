//! # spotmini core
//!
//! Credential lifecycle and playback plumbing shared by the spotmini
//! daemon, CLI and terminal UI.
//!
//! This crate provides:
//! - [`Credential`] and [`Secret`] - the persisted bearer/refresh token record
//! - [`TokenStore`] - file-backed (and in-memory) credential persistence
//! - [`TokenExchanger`] - authorization-code and refresh-token grants
//! - [`LoginFlow`] - browser consent plus a one-shot local callback listener
//! - [`CredentialManager`] - the single `authenticate()` entry point
//! - [`PlaybackClient`], [`StatusLine`], [`CommandDispatcher`] - the thin I/O
//!   layers built on top of an authenticated credential
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spotmini_core::{ClientCredentials, CredentialManager, Settings};
//!
//! async fn token() -> Result<String, Box<dyn std::error::Error>> {
//!     let settings = Settings::load()?;
//!     let manager = CredentialManager::from_settings(&settings, ClientCredentials::from_env()?)?;
//!     let credential = manager.authenticate().await?;
//!     Ok(credential.access_token.expose().to_string())
//! }
//! ```

pub mod config;
pub mod credential;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub mod login;
pub mod manager;
pub mod notify;
pub mod playback;
pub mod provider;
pub mod status;
pub mod store;

pub use config::Settings;

pub use credential::{Credential, Secret, TokenResponse, EXPIRY_MARGIN_SECS};

pub use dispatch::{Command, CommandDispatcher, Transport};

pub use error::{AuthError, SpotminiError};

pub use exchange::TokenExchanger;

pub use login::{AuthorizationCodeSource, LoginFlow};

pub use manager::{inspect_store, CredentialManager, CredentialState, DefaultCredentialManager};

pub use notify::{default_socket_path, DaemonNotifier};

pub use playback::{
    PlaybackClient,
    PlaybackConfig,
    PlaybackContext,
    PlaybackError,
    PlaybackSnapshot,
    TrackItem,
};

pub use provider::{ClientCredentials, ProviderConfig};

pub use status::{PlayState, StatusLine};

pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
