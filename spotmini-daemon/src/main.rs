//! spotmini daemon
//!
//! Keeps the status file current: refreshes the credential as needed, reads
//! the player state and rewrites the status-bar JSON on a timer or whenever a
//! foreground command wakes it.
//!
//! # Running
//!
//! ```bash
//! SPOTIFY_ID=... SPOTIFY_SECRET=... cargo run -p spotmini-daemon
//! # or after install:
//! spotminid
//! ```

use anyhow::{Context, Result};
use spotmini_core::{ClientCredentials, DefaultCredentialManager, PlaybackClient, Settings};
use spotmini_daemon::StatusPublisher;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    init_logging(&settings.log_level);

    info!("Starting spotmini daemon...");
    info!("Loaded configuration from {:?}", settings.config_path);

    let credentials = ClientCredentials::from_env()
        .context("Client credentials are required to talk to Spotify")?;

    run_daemon(settings, credentials).await
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run_daemon(settings: Settings, credentials: ClientCredentials) -> Result<()> {
    let manager = DefaultCredentialManager::from_settings(&settings, credentials)?;
    let playback = PlaybackClient::new(&settings.playback())?;
    let publisher = StatusPublisher::new(
        manager,
        playback,
        settings.status_path.clone(),
        settings.refresh_interval(),
    );

    let (wake_tx, wake_rx) = mpsc::channel(1);

    #[cfg(unix)]
    let listener = spotmini_daemon::WakeListener::start(&settings.socket_path, wake_tx.clone()).await?;
    #[cfg(unix)]
    let signal_task = spotmini_daemon::wake::spawn_signal_wake(wake_tx.clone())?;
    drop(wake_tx);

    info!("Daemon running. Press Ctrl+C to stop.");
    publisher.run(wake_rx, shutdown_signal()).await;
    info!("Shutdown signal received, stopping...");

    #[cfg(unix)]
    {
        signal_task.abort();
        listener.stop().await?;
    }

    info!("Daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
