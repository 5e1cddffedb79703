//! Configuration shared by the daemon, the CLI and the terminal UI.
//!
//! Settings are read from `~/.config/spotmini/config.toml` (platform
//! equivalent elsewhere). Every key is optional:
//!
//! ```toml
//! status_path = "/tmp/spotmini.json"
//! refresh_interval_secs = 2
//! callback_port = 8000
//! login_timeout_secs = 300   # 0 waits forever
//! open_browser = true
//! log_level = "info"
//! ```
//!
//! Client id and secret are never read from this file; see
//! [`ClientCredentials::from_env`](crate::provider::ClientCredentials::from_env).

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SpotminiError;
use crate::notify::default_socket_path;
use crate::playback::PlaybackConfig;
use crate::provider::ProviderConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the credential is persisted.
    pub token_path: PathBuf,

    /// Where the daemon publishes the status-bar JSON.
    pub status_path: PathBuf,

    /// Unix socket the daemon listens on for wake notifications.
    pub socket_path: PathBuf,

    /// Seconds between timer-driven status updates.
    pub refresh_interval_secs: u64,

    /// Loopback port used for the OAuth redirect.
    pub callback_port: u16,

    /// Bound on the wait for the OAuth callback; 0 disables the bound.
    pub login_timeout_secs: u64,

    /// Launch the default browser at login.
    pub open_browser: bool,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Playback API base URL.
    pub api_base: String,

    /// OAuth authorization endpoint.
    pub auth_url: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let dirs = project_dirs();
        let config_dir = dirs
            .as_ref()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".spotmini"));
        let provider = ProviderConfig::spotify();

        Self {
            token_path: config_dir.join("token.json"),
            status_path: std::env::temp_dir().join("spotmini.json"),
            socket_path: default_socket_path(),
            refresh_interval_secs: 2,
            callback_port: provider.callback_port,
            login_timeout_secs: 300,
            open_browser: true,
            log_level: "info".to_string(),
            api_base: PlaybackConfig::default().api_base,
            auth_url: provider.auth_url,
            token_url: provider.token_url,
            config_path: PathBuf::new(),
        }
    }
}

impl Settings {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("spotmini.toml"))
    }

    /// Load configuration from the default location or fall back to defaults.
    pub fn load() -> Result<Self, SpotminiError> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load configuration from `path`; a missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, SpotminiError> {
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents).map_err(|e| SpotminiError::Config {
                message: format!("failed to parse {:?}: {}", path, e),
            })?
        } else {
            Settings::default()
        };

        settings.config_path = path.to_path_buf();
        Ok(settings)
    }

    /// Provider endpoints and callback port.
    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig::spotify()
            .with_auth_url(&self.auth_url)
            .with_token_url(&self.token_url)
            .with_callback_port(self.callback_port)
    }

    /// Playback API client settings.
    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            api_base: self.api_base.clone(),
            ..PlaybackConfig::default()
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn login_timeout(&self) -> Option<Duration> {
        (self.login_timeout_secs > 0).then(|| Duration::from_secs(self.login_timeout_secs))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "spotmini")
}
