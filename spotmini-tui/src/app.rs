//! Application state for the spotmini TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use spotmini_core::{PlaybackSnapshot, TrackItem};

/// Rows taken by everything except the queue list.
const FIXED_OVERHEAD: u16 = 9;
/// Upper bound on visible queue rows.
const MAX_QUEUE_ROWS: usize = 10;
/// Most URIs handed to the player when jumping outside a context.
const MAX_JUMP_URIS: usize = 50;

const DEFAULT_WIDTH: u16 = 40;
const DEFAULT_HEIGHT: u16 = 24;

/// Which part of the screen receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Buttons,
    Queue,
}

/// The three transport buttons, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Previous,
    PlayPause,
    Next,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Previous, Button::PlayPause, Button::Next];

    pub fn glyph(&self) -> &'static str {
        match self {
            Button::Previous => "⏮",
            Button::PlayPause => "⏯",
            Button::Next => "⏭",
        }
    }
}

/// Work a key press asks the event loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Press(Button),
    Jump(QueueJump),
}

/// How to start playback at a queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueJump {
    /// Name of the selected item, for the status message.
    pub name: String,
    /// `(context_uri, offset_uri)` when the current context can be restarted at the item.
    pub context: Option<(String, String)>,
    /// The selected item and what follows it, used when the context path is unavailable.
    pub uris: Vec<String>,
}

/// Application state
pub struct App {
    pub focus: Focus,
    pub button_cursor: usize,
    pub queue_cursor: usize,
    pub queue_offset: usize,
    pub snapshot: Option<PlaybackSnapshot>,
    pub queue: Vec<TrackItem>,
    /// Status message to display
    pub message: String,
    width: u16,
    height: u16,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            focus: Focus::Buttons,
            button_cursor: 1,
            queue_cursor: 0,
            queue_offset: 0,
            snapshot: None,
            queue: Vec::new(),
            message: String::new(),
            width: 0,
            height: 0,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn width(&self) -> u16 {
        if self.width == 0 { DEFAULT_WIDTH } else { self.width }
    }

    pub fn height(&self) -> u16 {
        if self.height == 0 { DEFAULT_HEIGHT } else { self.height }
    }

    /// Number of queue rows that fit on screen; 0 hides the queue.
    pub fn queue_view_height(&self) -> usize {
        let available = i32::from(self.height()) - i32::from(FIXED_OVERHEAD);
        if available < 1 {
            0
        } else {
            (available as usize).min(MAX_QUEUE_ROWS)
        }
    }

    /// Width usable for text lines.
    pub fn content_width(&self) -> usize {
        let available = usize::from(self.width()).saturating_sub(4);
        if available < 20 { 30 } else { available }
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.is_playing)
    }

    pub fn set_snapshot(&mut self, snapshot: Option<PlaybackSnapshot>) {
        self.snapshot = snapshot;
    }

    /// Replace the queue, keeping the cursor inside it.
    pub fn set_queue(&mut self, queue: Vec<TrackItem>) {
        self.queue = queue;
        if self.queue.is_empty() {
            self.queue_cursor = 0;
            self.queue_offset = 0;
        } else if self.queue_cursor >= self.queue.len() {
            self.queue_cursor = self.queue.len() - 1;
        }
        self.queue_offset = self.queue_offset.min(self.queue_cursor);
    }

    pub fn selected_button(&self) -> Button {
        Button::ALL[self.button_cursor.min(Button::ALL.len() - 1)]
    }

    /// Translate a key press into state changes and an [`Action`].
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_up();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_down();
                Action::None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if self.focus == Focus::Buttons && self.button_cursor > 0 {
                    self.button_cursor -= 1;
                }
                Action::None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.focus == Focus::Buttons && self.button_cursor < Button::ALL.len() - 1 {
                    self.button_cursor += 1;
                }
                Action::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(),
            _ => Action::None,
        }
    }

    fn move_up(&mut self) {
        if self.focus != Focus::Queue {
            return;
        }
        if self.queue_cursor > 0 {
            self.queue_cursor -= 1;
            if self.queue_cursor < self.queue_offset {
                self.queue_offset -= 1;
            }
        } else {
            self.focus = Focus::Buttons;
        }
    }

    fn move_down(&mut self) {
        if self.focus == Focus::Buttons {
            self.focus = Focus::Queue;
            return;
        }
        if self.queue_cursor + 1 < self.queue.len() {
            self.queue_cursor += 1;
            let rows = self.queue_view_height().max(1);
            if self.queue_cursor >= self.queue_offset + rows {
                self.queue_offset += 1;
            }
        }
    }

    fn activate(&self) -> Action {
        match self.focus {
            Focus::Buttons => Action::Press(self.selected_button()),
            Focus::Queue => self.queue_jump().map_or(Action::None, Action::Jump),
        }
    }

    /// Plan playback starting at the selected queue entry.
    pub fn queue_jump(&self) -> Option<QueueJump> {
        let target = self.queue.get(self.queue_cursor)?;

        let context = self
            .snapshot
            .as_ref()
            .and_then(|s| s.context.as_ref())
            .filter(|ctx| ctx.supports_offset() && !target.uri.is_empty())
            .map(|ctx| (ctx.uri.clone(), target.uri.clone()));

        let uris = self.queue[self.queue_cursor..]
            .iter()
            .filter(|item| !item.uri.is_empty())
            .take(MAX_JUMP_URIS)
            .map(|item| item.uri.clone())
            .collect();

        Some(QueueJump {
            name: target.name.clone(),
            context,
            uris,
        })
    }

    /// Queue entries currently scrolled into view, with their indices.
    pub fn visible_queue(&self) -> impl Iterator<Item = (usize, &TrackItem)> {
        self.queue
            .iter()
            .enumerate()
            .skip(self.queue_offset)
            .take(self.queue_view_height())
    }
}

/// Cut `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max < 3 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}
