//! Status-bar output.
//!
//! [`StatusLine`] is the JSON document a status bar (waybar-style custom
//! module) reads: `{"text", "class", "tooltip"?, "alt"}`. [`publish`] replaces
//! the status file atomically so a reader never sees a half-written document.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::playback::PlaybackSnapshot;

/// CSS class reported for every line.
pub const STATUS_CLASS: &str = "spotify";

const PLAY_ICON: char = '\u{f04b}';
const PAUSE_ICON: char = '\u{f04c}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
}

/// One status-bar document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub text: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    pub alt: PlayState,
}

impl StatusLine {
    /// The line shown when nothing is playing.
    pub fn stopped() -> Self {
        Self {
            text: String::new(),
            class: STATUS_CLASS.to_string(),
            tooltip: None,
            alt: PlayState::Stopped,
        }
    }

    /// Render a playback snapshot; `None` or an empty player renders as stopped.
    pub fn from_snapshot(snapshot: Option<&PlaybackSnapshot>) -> Self {
        let Some((snapshot, item)) =
            snapshot.and_then(|s| s.item.as_ref().map(|item| (s, item)))
        else {
            return Self::stopped();
        };

        let (icon, alt) = if snapshot.is_playing {
            (PLAY_ICON, PlayState::Playing)
        } else {
            (PAUSE_ICON, PlayState::Paused)
        };

        Self {
            text: format!("{} {}", icon, item.name),
            class: STATUS_CLASS.to_string(),
            tooltip: Some(format!("{} by {}", item.name, item.primary_artist())),
            alt,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Atomically replace `path` with `line`.
///
/// The document is written to a temporary file in the same directory and
/// renamed over the target.
pub fn publish(path: &Path, line: &StatusLine) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new()
        .prefix(".spotmini-status")
        .tempfile_in(dir)?;
    file.write_all(line.to_json()?.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
