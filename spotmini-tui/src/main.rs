//! spotmini TUI - now playing view with transport controls and the queue.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use spotmini_core::{
    AuthError, ClientCredentials, CommandDispatcher, Credential, DaemonNotifier,
    DefaultCredentialManager, PlaybackClient, Settings, Transport,
};
use std::io::{self, stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

mod app;
mod ui;

use app::{Action, App, Button, QueueJump};
use ui::Theme;

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const LOGIN_REQUIRED: &str = "Login required, run `spotmini login`";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they stay out of the alternate screen.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load().context("Failed to load configuration")?;
    let credentials = ClientCredentials::from_env()
        .context("Client credentials are required to talk to Spotify")?;
    let session = Session::new(&settings, credentials)?;

    // Log in before taking over the screen; the login flow prints its URL.
    session
        .manager
        .authenticate()
        .await
        .context("Authentication failed")?;

    info!("Starting spotmini TUI");

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new();
    let result = run_app(&mut terminal, &mut app, &session, &Theme::default()).await;

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("Application error: {}", e);
    }

    info!("spotmini TUI exited");
    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    session: &Session,
    theme: &Theme,
) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);
    session.refresh(app).await;
    let mut last_refresh = Instant::now();

    loop {
        terminal.draw(|frame| ui::render(frame, app, theme))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.handle_key(key) {
                    Action::Quit => break,
                    Action::None => {}
                    action => {
                        session.perform(app, action).await;
                        last_refresh = Instant::now();
                    }
                },
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= REFRESH_INTERVAL {
            session.refresh(app).await;
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Authenticated access to the player for the lifetime of the UI.
struct Session {
    manager: DefaultCredentialManager,
    dispatcher: CommandDispatcher,
}

impl Session {
    fn new(settings: &Settings, credentials: ClientCredentials) -> Result<Self> {
        let manager = DefaultCredentialManager::from_settings(settings, credentials)?;
        let dispatcher = CommandDispatcher::new(
            PlaybackClient::new(&settings.playback())?,
            DaemonNotifier::new(&settings.socket_path),
        );
        Ok(Self { manager, dispatcher })
    }

    /// The stored or refreshed credential. The screen belongs to the UI, so
    /// a missing login is reported in the message line instead of started.
    async fn credential(&self, app: &mut App) -> Option<Credential> {
        let result = self.manager.authenticate_without_login().await;
        app.message = login_message(&result, &app.message);
        match result {
            Ok(credential) => Some(credential),
            Err(e) => {
                debug!("Authentication failed: {}", e);
                None
            }
        }
    }

    /// Reload the player state and queue.
    async fn refresh(&self, app: &mut App) {
        let Some(credential) = self.credential(app).await else {
            return;
        };
        let playback = self.dispatcher.playback();

        match playback.current_playback(&credential).await {
            Ok(snapshot) => app.set_snapshot(snapshot),
            Err(e) => debug!("Failed to fetch playback state: {}", e),
        }
        match playback.queue(&credential).await {
            Ok(queue) => app.set_queue(queue),
            Err(e) => debug!("Failed to fetch queue: {}", e),
        }
    }

    async fn perform(&self, app: &mut App, action: Action) {
        let Some(credential) = self.credential(app).await else {
            return;
        };

        let settle = match action {
            Action::Press(button) => {
                let transport = match button {
                    Button::Previous => Transport::Previous,
                    Button::Next => Transport::Next,
                    Button::PlayPause if app.is_playing() => Transport::Pause,
                    Button::PlayPause => Transport::Play,
                };
                app.message = match self.dispatcher.send(transport, &credential).await {
                    Ok(()) => transport.label().to_string(),
                    Err(e) => format!("{} failed: {}", transport.label(), e),
                };
                Duration::from_millis(100)
            }
            Action::Jump(jump) => {
                app.message = self.jump(&jump, &credential).await;
                Duration::from_millis(200)
            }
            Action::None | Action::Quit => return,
        };

        self.dispatcher.notify().await;

        // Give the service a moment before reading the new state back.
        tokio::time::sleep(settle).await;
        self.refresh(app).await;
    }

    async fn jump(&self, jump: &QueueJump, credential: &Credential) -> String {
        let playback = self.dispatcher.playback();

        if let Some((context_uri, offset_uri)) = &jump.context {
            match playback.play_context(context_uri, offset_uri, credential).await {
                Ok(()) => return format!("Skipped to: {}", jump.name),
                Err(e) => debug!("Context jump failed, playing URIs instead: {}", e),
            }
        }

        if jump.uris.is_empty() {
            return String::new();
        }
        match playback.play_uris(&jump.uris, credential).await {
            Ok(()) => format!("Playing: {}", jump.name),
            Err(e) => format!("Failed to play {}: {}", jump.name, e),
        }
    }
}

/// Message line after an authentication attempt.
fn login_message(result: &Result<Credential, AuthError>, current: &str) -> String {
    match result {
        Err(AuthError::LoginRequired) => LOGIN_REQUIRED.to_string(),
        Err(e) => format!("Not logged in: {}", e),
        Ok(_) if current == LOGIN_REQUIRED || current.starts_with("Not logged in") => String::new(),
        Ok(_) => current.to_string(),
    }
}
