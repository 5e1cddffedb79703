//! Playback API access.
//!
//! - [`model`] - Snapshot and queue types as returned by the API
//! - [`client`] - Bearer-authenticated GET/PUT/POST calls

pub mod client;
pub mod model;

pub use client::{PlaybackClient, PlaybackConfig, PlaybackError};
pub use model::{Artist, PlaybackContext, PlaybackSnapshot, TrackItem};
