//! OAuth provider endpoints and client credentials.
//!
//! This module provides:
//! - [`ProviderConfig`] - Endpoints, scopes and callback port of the provider
//! - [`ClientCredentials`] - The registered application's id and secret

use serde::{Deserialize, Serialize};

use crate::credential::Secret;
use crate::error::SpotminiError;

/// Environment variable holding the OAuth client id.
pub const CLIENT_ID_VAR: &str = "SPOTIFY_ID";

/// Environment variable holding the OAuth client secret.
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_SECRET";

/// Configuration for the OAuth provider.
///
/// # Example
///
/// ```
/// use spotmini_core::provider::ProviderConfig;
///
/// let provider = ProviderConfig::spotify().with_callback_port(8888);
/// assert_eq!(provider.redirect_uri(), "http://127.0.0.1:8888/callback");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// OAuth authorization endpoint URL.
    pub auth_url: String,

    /// OAuth token endpoint URL.
    pub token_url: String,

    /// Scopes requested at login.
    pub scopes: Vec<String>,

    /// Local port the consent page redirects back to.
    pub callback_port: u16,
}

impl ProviderConfig {
    /// Spotify accounts service with the playback scopes.
    pub fn spotify() -> Self {
        Self {
            auth_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            scopes: vec![
                "user-read-playback-state".to_string(),
                "user-modify-playback-state".to_string(),
            ],
            callback_port: 8000,
        }
    }

    /// Set the authorization URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Set the token URL.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set the callback port.
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    /// Redirect URI registered with the provider.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.callback_port)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::spotify()
    }
}

/// Client id and secret of the registered application.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Secret,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
        }
    }

    /// Read `SPOTIFY_ID` and `SPOTIFY_SECRET` from the environment.
    pub fn from_env() -> Result<Self, SpotminiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SpotminiError> {
        let read = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| SpotminiError::Config {
                    message: format!("missing {} / {}", CLIENT_ID_VAR, CLIENT_SECRET_VAR),
                })
        };

        Ok(Self::new(read(CLIENT_ID_VAR)?, read(CLIENT_SECRET_VAR)?))
    }
}
