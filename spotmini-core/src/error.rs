//! Error types for spotmini.

use reqwest::StatusCode;
use thiserror::Error;

use crate::playback::PlaybackError;
use crate::store::StoreError;

/// Error type for obtaining a usable credential.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint answered with a non-200 status.
    #[error("token endpoint returned {status}")]
    Rejected { status: StatusCode },

    /// The token endpoint answered 200 with a body we could not use.
    #[error("malformed token response: {message}")]
    MalformedResponse { message: String },

    /// Transport failure or timeout talking to the token endpoint.
    #[error("network error: {message}")]
    Network { message: String },

    /// The interactive login could not capture an authorization code.
    #[error("login failed: {message}")]
    Login { message: String },

    /// No usable credential and the caller ruled out an interactive login.
    #[error("login required")]
    LoginRequired,

    /// Storage error while reading or writing the credential.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Top-level error type encompassing all spotmini errors.
#[derive(Debug, Error)]
pub enum SpotminiError {
    /// Error from credential storage.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error from authentication.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Error from a playback API call.
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Filesystem error outside the credential store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
