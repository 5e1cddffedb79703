//! spotmini daemon library
//!
//! This library exposes the status publisher loop and the wake listener for
//! testing and for the `spotminid` binary.

pub mod publisher;
#[cfg(unix)]
pub mod wake;

pub use publisher::{StatusPublisher, UpdateOutcome};
#[cfg(unix)]
pub use wake::WakeListener;
