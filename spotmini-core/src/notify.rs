//! Cross-process wake notifications.
//!
//! Foreground commands poke the daemon through a Unix socket so the status
//! file reflects an action without waiting for the next timer tick. Delivery
//! is fire-and-forget: no daemon means nothing happens.

use std::path::PathBuf;
use std::time::Duration;

/// Line written to the daemon's socket to request an update.
pub const WAKE_MESSAGE: &[u8] = b"wake\n";

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Get the default wake socket path for the current platform.
pub fn default_socket_path() -> PathBuf {
    #[cfg(unix)]
    {
        if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR") {
            return PathBuf::from(runtime_dir).join("spotmini.sock");
        }
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/spotmini-{}.sock", uid))
    }

    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("spotmini.sock")
    }
}

/// Sends wake notifications to a running daemon.
#[derive(Debug, Clone)]
pub struct DaemonNotifier {
    socket_path: PathBuf,
}

impl DaemonNotifier {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Ask the daemon to refresh. Returns whether a daemon accepted the wake.
    #[cfg(unix)]
    pub async fn notify(&self) -> bool {
        use tokio::io::AsyncWriteExt;
        use tokio::net::UnixStream;

        let connect = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path));
        let mut stream = match connect.await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::debug!("No daemon at {:?}: {}", self.socket_path, e);
                return false;
            }
            Err(_) => {
                tracing::debug!("Timed out connecting to {:?}", self.socket_path);
                return false;
            }
        };

        match stream.write_all(WAKE_MESSAGE).await {
            Ok(()) => {
                tracing::debug!("Woke daemon at {:?}", self.socket_path);
                true
            }
            Err(e) => {
                tracing::debug!("Failed to wake daemon: {}", e);
                false
            }
        }
    }

    #[cfg(not(unix))]
    pub async fn notify(&self) -> bool {
        let _ = CONNECT_TIMEOUT;
        tracing::debug!("Daemon wake is not supported on this platform");
        false
    }
}
