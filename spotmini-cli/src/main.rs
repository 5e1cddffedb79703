//! spotmini CLI
//!
//! One-shot status output and transport controls.
//!
//! # Usage
//!
//! ```bash
//! # Print the status-bar line for the current track
//! spotmini status
//!
//! # Transport controls (the daemon is woken afterwards)
//! spotmini toggle
//! spotmini next
//!
//! # Inspect or reset the stored credential
//! spotmini token --format json
//! spotmini logout
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use spotmini_core::{
    inspect_store, AuthorizationCodeSource, ClientCredentials, Command, CommandDispatcher,
    Credential, CredentialManager, CredentialState, DaemonNotifier, DefaultCredentialManager,
    FileTokenStore, PlaybackClient, Settings, StatusLine, TokenStore,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spotmini")]
#[command(about = "Spotify now-playing status and transport controls")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the status-bar JSON line for the current track
    Status,

    /// Skip to the next track
    Next,

    /// Go back to the previous track
    Prev,

    /// Resume playback
    Play,

    /// Pause playback
    Pause,

    /// Pause when playing, play otherwise
    Toggle,

    /// Run the browser login and store a fresh credential
    Login,

    /// Remove the stored credential
    Logout,

    /// Show the state of the stored credential
    Token {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print the raw access token instead of a summary
        #[arg(long)]
        print_token: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Commands {
    /// The transport command this subcommand maps to, if any.
    fn transport(&self) -> Option<Command> {
        match self {
            Commands::Next => Some(Command::Next),
            Commands::Prev => Some(Command::Prev),
            Commands::Play => Some(Command::Play),
            Commands::Pause => Some(Command::Pause),
            Commands::Toggle => Some(Command::Toggle),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load_from_path(path),
        None => Settings::load(),
    }
    .context("Failed to load configuration")?;
    debug!("Loaded configuration from {:?}", settings.config_path);

    if let Some(command) = cli.command.transport() {
        return run_transport(&settings, command).await;
    }

    match cli.command {
        Commands::Status => print_status(&settings).await,
        Commands::Login => login(&settings).await,
        Commands::Logout => logout(&settings).await,
        Commands::Token { format, print_token } => show_token(&settings, format, print_token).await,
        Commands::Next | Commands::Prev | Commands::Play | Commands::Pause | Commands::Toggle => {
            Ok(())
        }
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn manager(settings: &Settings) -> Result<DefaultCredentialManager> {
    let credentials = ClientCredentials::from_env()
        .context("Client credentials are required to talk to Spotify")?;
    Ok(DefaultCredentialManager::from_settings(settings, credentials)?)
}

async fn print_status(settings: &Settings) -> Result<()> {
    let manager = manager(settings)?;
    let playback = PlaybackClient::new(&settings.playback())?;

    let line = status_line(&manager, &playback).await;
    println!("{}", line.to_json()?);
    Ok(())
}

/// The line for whatever is playing. Any failure renders as stopped so the
/// bar never shows stale or broken output.
async fn status_line<S: TokenStore, L: AuthorizationCodeSource>(
    manager: &CredentialManager<S, L>,
    playback: &PlaybackClient,
) -> StatusLine {
    let credential = match manager.authenticate().await {
        Ok(credential) => credential,
        Err(e) => {
            warn!("Authentication failed: {}", e);
            return StatusLine::stopped();
        }
    };

    match playback.current_playback(&credential).await {
        Ok(snapshot) => StatusLine::from_snapshot(snapshot.as_ref()),
        Err(e) => {
            warn!("Failed to read playback state: {}", e);
            StatusLine::stopped()
        }
    }
}

async fn run_transport(settings: &Settings, command: Command) -> Result<()> {
    let manager = manager(settings)?;
    let credential = manager.authenticate().await.context("Authentication failed")?;

    let dispatcher = CommandDispatcher::new(
        PlaybackClient::new(&settings.playback())?,
        DaemonNotifier::new(&settings.socket_path),
    );
    let transport = dispatcher
        .dispatch(command, &credential)
        .await
        .with_context(|| format!("'{}' failed", command))?;

    debug!("{} -> {}", command, transport.label());
    Ok(())
}

async fn login(settings: &Settings) -> Result<()> {
    let manager = manager(settings)?;
    let credential = manager.login().await.context("Login failed")?;

    println!("Logged in. Token valid until {}", credential.expiry.to_rfc3339());
    println!("  Stored at: {}", settings.token_path.display());
    Ok(())
}

async fn logout(settings: &Settings) -> Result<()> {
    let store = FileTokenStore::open(&settings.token_path)?;
    store.clear().await?;

    println!("Removed stored credential at {}", settings.token_path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct TokenReport {
    state: &'static str,
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_secs: Option<i64>,
    refreshable: bool,
}

impl TokenReport {
    fn new(
        path: &Path,
        state: CredentialState,
        stored: Option<&Credential>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state: state.as_str(),
            path: path.to_path_buf(),
            token_type: stored.map(|c| c.token_type.clone()),
            expiry: stored.map(|c| c.expiry),
            remaining_secs: stored.map(|c| (c.expiry - now).num_seconds().max(0)),
            refreshable: stored.is_some_and(|c| c.can_refresh()),
        }
    }

    fn to_text(&self) -> String {
        let mut text = format!("Credential: {}\n  Path: {}\n", self.state, self.path.display());
        if let Some(expiry) = self.expiry {
            text.push_str(&format!("  Expires: {}\n", expiry.to_rfc3339()));
        }
        if let Some(remaining) = self.remaining_secs {
            text.push_str(&format!("  Remaining: {}s\n", remaining));
        }
        if self.token_type.is_some() {
            let refreshable = if self.refreshable { "yes" } else { "no" };
            text.push_str(&format!("  Refreshable: {}\n", refreshable));
        }
        text
    }
}

/// The raw access token, only while it is still valid.
fn printable_token(state: CredentialState, stored: Option<&Credential>) -> Result<&str> {
    stored
        .filter(|_| state == CredentialState::Valid)
        .map(|c| c.access_token.expose())
        .with_context(|| format!("No valid token stored (state: {})", state))
}

// Reads the file directly so inspection works without client credentials.
async fn show_token(settings: &Settings, format: OutputFormat, print_token: bool) -> Result<()> {
    let store = FileTokenStore::open(&settings.token_path)?;
    let now = Utc::now();
    let (state, stored) = inspect_store(&store, now).await;

    if print_token {
        println!("{}", printable_token(state, stored.as_ref())?);
        return Ok(());
    }

    let report = TokenReport::new(&settings.token_path, state, stored.as_ref(), now);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.to_text()),
    }
    Ok(())
}
