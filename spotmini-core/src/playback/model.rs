//! Playback state as returned by `GET me/player` and `GET me/player/queue`.

use serde::{Deserialize, Serialize};

/// Point-in-time view of what the service is playing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    #[serde(default)]
    pub is_playing: bool,

    #[serde(default)]
    pub progress_ms: Option<u64>,

    #[serde(default)]
    pub item: Option<TrackItem>,

    #[serde(default)]
    pub context: Option<PlaybackContext>,
}

impl PlaybackSnapshot {
    /// Fraction of the current item already played, clamped to `0.0..=1.0`.
    pub fn progress_ratio(&self) -> f64 {
        match (&self.item, self.progress_ms) {
            (Some(item), Some(progress)) if item.duration_ms > 0 => {
                (progress as f64 / item.duration_ms as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// A track (or episode) in the player or the queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackItem {
    pub name: String,

    #[serde(default)]
    pub uri: String,

    #[serde(default)]
    pub duration_ms: u64,

    /// Empty for podcast episodes.
    #[serde(default)]
    pub artists: Vec<Artist>,
}

impl TrackItem {
    /// Name of the first credited artist, or an empty string.
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(|a| a.name.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

/// The album or playlist the current item is being played from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(default)]
    pub uri: String,

    #[serde(rename = "type", default)]
    pub kind: String,
}

impl PlaybackContext {
    /// Whether the context can be restarted at an arbitrary track offset.
    pub fn supports_offset(&self) -> bool {
        !self.uri.is_empty() && matches!(self.kind.as_str(), "playlist" | "album")
    }
}

/// Body of `GET me/player/queue`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct QueueResponse {
    #[serde(default)]
    pub queue: Vec<TrackItem>,
}
