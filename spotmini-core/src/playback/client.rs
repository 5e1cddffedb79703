//! HTTP client for the playback API.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::model::{PlaybackSnapshot, QueueResponse, TrackItem};
use crate::credential::Credential;

/// Error type for playback API calls.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The API answered with something other than 200/204.
    #[error("playback API returned {status}")]
    Rejected { status: StatusCode },

    /// Transport failure or timeout.
    #[error("network error: {message}")]
    Network { message: String },

    /// The response body did not match the expected shape.
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// The configured base URL or an endpoint could not be parsed.
    #[error("invalid API URL: {message}")]
    InvalidUrl { message: String },
}

/// Settings for [`PlaybackClient`].
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.spotify.com/v1/".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Serialize)]
struct PlayUris<'a> {
    uris: &'a [String],
}

#[derive(Serialize)]
struct PlayContext<'a> {
    context_uri: &'a str,
    offset: Offset<'a>,
}

#[derive(Serialize)]
struct Offset<'a> {
    uri: &'a str,
}

/// Playback API client.
///
/// Every call takes the credential to authenticate with, so one client can
/// outlive any number of token refreshes.
#[derive(Debug, Clone)]
pub struct PlaybackClient {
    http_client: reqwest::Client,
    api_base: Url,
}

impl PlaybackClient {
    pub fn new(config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        // Url::join drops the last segment unless the base ends with '/'.
        let mut base = config.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base).map_err(|e| PlaybackError::InvalidUrl {
            message: format!("{}: {}", base, e),
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlaybackError::Network {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_base,
        })
    }

    /// Current player state; `None` when nothing is playing (HTTP 204).
    pub async fn current_playback(
        &self,
        credential: &Credential,
    ) -> Result<Option<PlaybackSnapshot>, PlaybackError> {
        let response = self.request(Method::GET, "me/player", credential)?.send().await;
        let response = check(response)?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let snapshot = response.json().await.map_err(|e| PlaybackError::Decode {
            message: e.to_string(),
        })?;
        Ok(Some(snapshot))
    }

    /// Tracks queued after the current item.
    pub async fn queue(&self, credential: &Credential) -> Result<Vec<TrackItem>, PlaybackError> {
        let response = self
            .request(Method::GET, "me/player/queue", credential)?
            .send()
            .await;
        let response = check(response)?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body: QueueResponse = response.json().await.map_err(|e| PlaybackError::Decode {
            message: e.to_string(),
        })?;
        Ok(body.queue)
    }

    /// Bodyless transport call, e.g. `PUT me/player/pause`.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<(), PlaybackError> {
        let path = format!("me/player/{}", endpoint);
        let response = self.request(method, &path, credential)?.send().await;
        check(response).map(|_| ())
    }

    /// Replace the playing items with `uris`.
    pub async fn play_uris(&self, uris: &[String], credential: &Credential) -> Result<(), PlaybackError> {
        let response = self
            .request(Method::PUT, "me/player/play", credential)?
            .json(&PlayUris { uris })
            .send()
            .await;
        check(response).map(|_| ())
    }

    /// Restart `context_uri` at the track `offset_uri`.
    pub async fn play_context(
        &self,
        context_uri: &str,
        offset_uri: &str,
        credential: &Credential,
    ) -> Result<(), PlaybackError> {
        let body = PlayContext {
            context_uri,
            offset: Offset { uri: offset_uri },
        };
        let response = self
            .request(Method::PUT, "me/player/play", credential)?
            .json(&body)
            .send()
            .await;
        check(response).map(|_| ())
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
    ) -> Result<reqwest::RequestBuilder, PlaybackError> {
        let url = self.api_base.join(path).map_err(|e| PlaybackError::InvalidUrl {
            message: format!("{}: {}", path, e),
        })?;

        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(credential.access_token.expose()))
    }
}

fn check(response: reqwest::Result<reqwest::Response>) -> Result<reqwest::Response, PlaybackError> {
    let response = response.map_err(|e| PlaybackError::Network {
        message: e.to_string(),
    })?;

    match response.status() {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(response),
        status => Err(PlaybackError::Rejected { status }),
    }
}
