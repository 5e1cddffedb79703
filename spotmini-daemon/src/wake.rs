//! Wake listener on a Unix socket.
//!
//! Every connection that sends a `wake` line pushes onto a capacity-1
//! channel. A full channel means an update is already pending, so bursts of
//! wakes collapse into a single update.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a running wake listener.
pub struct WakeListener {
    socket_path: PathBuf,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WakeListener {
    /// Bind `socket_path` and forward wakes to `wake`.
    ///
    /// Fails if another daemon already answers on the socket. A stale socket
    /// file left by a dead daemon is replaced.
    pub async fn start(socket_path: &Path, wake: mpsc::Sender<()>) -> Result<Self> {
        if socket_path.exists() {
            if UnixStream::connect(socket_path).await.is_ok() {
                bail!("Another daemon is already listening on {:?}", socket_path);
            }
            warn!("Removing stale socket at {:?}", socket_path);
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove stale socket at {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket at {:?}", socket_path))?;
        info!("Listening for wake notifications on {:?}", socket_path);

        let (tx, mut rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = rx.recv() => {
                        debug!("Wake listener shutdown signal received");
                        break;
                    }
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _addr)) => {
                                let wake = wake.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(stream, wake).await {
                                        debug!("Wake connection error: {}", e);
                                    }
                                });
                            }
                            Err(e) => {
                                warn!("Failed to accept wake connection: {}", e);
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            socket_path: socket_path.to_path_buf(),
            shutdown: Mutex::new(Some(tx)),
            join_handle: Mutex::new(Some(task)),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Stop accepting connections and remove the socket file.
    pub async fn stop(&self) -> Result<()> {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.join_handle.lock().await.take() {
            let _ = handle.await;
        }

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .with_context(|| format!("Failed to remove socket at {:?}", self.socket_path))?;
            debug!("Socket file removed");
        }
        Ok(())
    }
}

async fn handle_connection(stream: UnixStream, wake: mpsc::Sender<()>) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        if line.trim() == "wake" {
            signal(&wake);
        } else {
            debug!("Ignoring unexpected message: {:?}", line.trim());
        }
        line.clear();
    }

    Ok(())
}

fn signal(wake: &mpsc::Sender<()>) {
    match wake.try_send(()) {
        Ok(()) => debug!("Wake queued"),
        Err(TrySendError::Full(())) => debug!("Wake coalesced with pending update"),
        Err(TrySendError::Closed(())) => debug!("Wake dropped, publisher stopped"),
    }
}

/// Forward SIGUSR1 to `wake` until the channel closes.
pub fn spawn_signal_wake(wake: mpsc::Sender<()>) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut usr1 =
        unix_signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;

    Ok(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            if wake.is_closed() {
                break;
            }
            debug!("SIGUSR1 received");
            signal(&wake);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_bursts_of_wakes_coalesce() {
        let (tx, mut rx) = mpsc::channel(1);

        signal(&tx);
        signal(&tx);
        signal(&tx);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_listener_forwards_wake_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run").join("spotmini.sock");
        let (tx, mut rx) = mpsc::channel(1);

        let listener = match WakeListener::start(&path, tx).await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("Skipping test: Unix sockets not permitted: {}", e);
                return;
            }
        };

        let mut client = UnixStream::connect(&path).await.unwrap();
        client.write_all(b"wake\n").await.unwrap();
        drop(client);

        let received = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv()).await;
        assert_eq!(received.unwrap(), Some(()));

        listener.stop().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_stale_socket_is_replaced() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("spotmini.sock");
        let stale = match std::os::unix::net::UnixListener::bind(&path) {
            Ok(stale) => stale,
            Err(e) => {
                eprintln!("Skipping test: Unix sockets not permitted: {}", e);
                return;
            }
        };
        drop(stale);

        let (tx, _rx) = mpsc::channel(1);
        let listener = WakeListener::start(&path, tx).await.unwrap();

        assert!(path.exists());
        listener.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_daemon_is_refused() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("spotmini.sock");
        let (tx, _rx) = mpsc::channel(1);

        let first = match WakeListener::start(&path, tx.clone()).await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("Skipping test: Unix sockets not permitted: {}", e);
                return;
            }
        };

        assert!(WakeListener::start(&path, tx).await.is_err());
        first.stop().await.unwrap();
    }
}
