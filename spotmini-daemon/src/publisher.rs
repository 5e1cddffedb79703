//! The status publishing loop.

use spotmini_core::{
    status, AuthorizationCodeSource, CredentialManager, PlayState, PlaybackClient, StatusLine,
    TokenStore,
};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Result of one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new status line was written.
    Published(PlayState),
    /// The cycle was abandoned; the previous file is left in place.
    Skipped,
}

/// Periodically renders the playback state into the status file.
pub struct StatusPublisher<S, L> {
    manager: CredentialManager<S, L>,
    playback: PlaybackClient,
    status_path: PathBuf,
    interval: Duration,
}

impl<S: TokenStore, L: AuthorizationCodeSource> StatusPublisher<S, L> {
    pub fn new(
        manager: CredentialManager<S, L>,
        playback: PlaybackClient,
        status_path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            manager,
            playback,
            status_path: status_path.into(),
            interval,
        }
    }

    /// Authenticate, fetch the player state and publish it.
    ///
    /// Never fails: any error skips the cycle so the last good status stays visible.
    pub async fn update_once(&self) -> UpdateOutcome {
        let credential = match self.manager.authenticate().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Skipping status update, authentication failed: {}", e);
                return UpdateOutcome::Skipped;
            }
        };

        let snapshot = match self.playback.current_playback(&credential).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Skipping status update, playback fetch failed: {}", e);
                return UpdateOutcome::Skipped;
            }
        };

        let line = StatusLine::from_snapshot(snapshot.as_ref());
        if let Err(e) = status::publish(&self.status_path, &line) {
            warn!("Failed to publish status to {:?}: {}", self.status_path, e);
            return UpdateOutcome::Skipped;
        }

        debug!("Published {:?} status", line.alt);
        UpdateOutcome::Published(line.alt)
    }

    /// Run until `shutdown` resolves.
    ///
    /// Timer ticks and wake notifications feed this one loop, so at most one
    /// update is in flight. The first tick fires immediately. An update that
    /// is still running when `shutdown` resolves is abandoned.
    pub async fn run(&self, mut wake: mpsc::Receiver<()>, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Publishing status to {:?} every {:?}",
            self.status_path, self.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Publisher shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
                Some(()) = wake.recv() => {
                    debug!("Wake notification received");
                }
            }

            // A cycle can sit in an interactive login; shutdown must still win.
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Publisher shutdown signal received during update");
                    break;
                }
                _ = self.update_once() => {}
            }
        }
    }
}
