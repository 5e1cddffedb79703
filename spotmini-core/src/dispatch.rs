//! One-shot transport commands.
//!
//! [`CommandDispatcher`] maps the fixed command vocabulary onto exactly one
//! playback call and then wakes the daemon, whether or not the call worked.

use reqwest::Method;
use std::str::FromStr;

use crate::credential::Credential;
use crate::notify::DaemonNotifier;
use crate::playback::{PlaybackClient, PlaybackError};

/// A command accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Play,
    Pause,
    Toggle,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Next,
        Command::Prev,
        Command::Play,
        Command::Pause,
        Command::Toggle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Toggle => "toggle",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown command '{}' (expected next, prev, play, pause or toggle)", s))
    }
}

/// The playback call a command resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Next,
    Previous,
    Play,
    Pause,
}

impl Transport {
    pub fn method(&self) -> Method {
        match self {
            Transport::Next | Transport::Previous => Method::POST,
            Transport::Play | Transport::Pause => Method::PUT,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Transport::Next => "next",
            Transport::Previous => "previous",
            Transport::Play => "play",
            Transport::Pause => "pause",
        }
    }

    /// Short message for the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Transport::Next => "Next",
            Transport::Previous => "Prev",
            Transport::Play => "Playing",
            Transport::Pause => "Paused",
        }
    }
}

/// Executes commands and wakes the daemon afterwards.
pub struct CommandDispatcher {
    playback: PlaybackClient,
    notifier: DaemonNotifier,
}

impl CommandDispatcher {
    pub fn new(playback: PlaybackClient, notifier: DaemonNotifier) -> Self {
        Self { playback, notifier }
    }

    pub fn playback(&self) -> &PlaybackClient {
        &self.playback
    }

    /// Run `command` and notify the daemon.
    ///
    /// Returns the transport call that was issued.
    pub async fn dispatch(
        &self,
        command: Command,
        credential: &Credential,
    ) -> Result<Transport, PlaybackError> {
        let transport = self.resolve(command, credential).await;
        let result = self.send(transport, credential).await;

        self.notifier.notify().await;
        result.map(|_| transport)
    }

    /// Issue `transport` directly.
    pub async fn send(&self, transport: Transport, credential: &Credential) -> Result<(), PlaybackError> {
        tracing::debug!("Sending {} {}", transport.method(), transport.endpoint());
        self.playback
            .send(transport.method(), transport.endpoint(), credential)
            .await
    }

    /// Wake the daemon without issuing a call.
    pub async fn notify(&self) -> bool {
        self.notifier.notify().await
    }

    async fn resolve(&self, command: Command, credential: &Credential) -> Transport {
        match command {
            Command::Next => Transport::Next,
            Command::Prev => Transport::Previous,
            Command::Play => Transport::Play,
            Command::Pause => Transport::Pause,
            Command::Toggle => match self.playback.current_playback(credential).await {
                Ok(Some(snapshot)) if snapshot.is_playing => Transport::Pause,
                Ok(_) => Transport::Play,
                Err(e) => {
                    tracing::debug!("Could not read playback state for toggle: {}", e);
                    Transport::Play
                }
            },
        }
    }
}
