//! UI rendering for the spotmini TUI.

use crate::app::{truncate, App, Button, Focus};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const BAR_WIDTH: usize = 25;

/// Colors used by the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub text: Color,
    pub dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(0x1d, 0xb9, 0x54),
            text: Color::Rgb(0xd9, 0xdc, 0xcf),
            dim: Color::Rgb(0x5c, 0x5c, 0x5c),
        }
    }
}

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = frame.area();
    let width = app.content_width();
    let lines = build_lines(app, theme, width);

    let height = (lines.len() as u16).min(area.height);
    let width = (width as u16).min(area.width);
    let centered = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    frame.render_widget(Paragraph::new(lines), centered);
}

fn build_lines<'a>(app: &'a App, theme: &Theme, width: usize) -> Vec<Line<'a>> {
    let (title, artist) = match app.snapshot.as_ref().and_then(|s| s.item.as_ref()) {
        Some(item) => (item.name.as_str(), item.primary_artist()),
        None => ("Nothing Playing", "Spotify"),
    };
    let text_width = width.saturating_sub(2);

    let mut lines = vec![
        Line::from(Span::styled(
            truncate(title, text_width),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            truncate(artist, text_width),
            Style::default().fg(theme.dim),
        ))
        .alignment(Alignment::Center),
        progress_line(app, theme),
        button_line(app, theme),
        Line::from(Span::styled(app.message.clone(), Style::default().fg(theme.dim)))
            .alignment(Alignment::Center),
    ];

    lines.extend(queue_lines(app, theme, width));
    lines
}

fn progress_line(app: &App, theme: &Theme) -> Line<'static> {
    let ratio = app.snapshot.as_ref().map_or(0.0, |s| s.progress_ratio());
    let filled = ((BAR_WIDTH as f64 * ratio) as usize).min(BAR_WIDTH);

    Line::from(vec![
        Span::styled("━".repeat(filled), Style::default().fg(theme.accent)),
        Span::styled("●", Style::default().fg(theme.accent)),
        Span::styled("─".repeat(BAR_WIDTH - filled), Style::default().fg(theme.dim)),
    ])
    .alignment(Alignment::Center)
}

fn button_line(app: &App, theme: &Theme) -> Line<'static> {
    let spans: Vec<Span> = Button::ALL
        .iter()
        .enumerate()
        .map(|(i, button)| {
            if app.focus == Focus::Buttons && app.button_cursor == i {
                Span::styled(
                    format!(" [{}] ", button.glyph()),
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {} ", button.glyph()), Style::default().fg(theme.dim))
            }
        })
        .collect();

    Line::from(spans).alignment(Alignment::Center)
}

fn queue_lines(app: &App, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    if app.queue.is_empty() || app.queue_view_height() == 0 {
        return Vec::new();
    }

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "Next Up:",
            Style::default().fg(theme.dim).add_modifier(Modifier::BOLD),
        )),
    ];

    for (i, item) in app.visible_queue() {
        let prefix = format!("{}. ", i + 1);
        let max_name = width.saturating_sub(prefix.chars().count() + 2).max(5);
        let entry = format!("{}{}", prefix, truncate(&item.name, max_name));

        let line = if app.focus == Focus::Queue && app.queue_cursor == i {
            Line::from(Span::styled(
                format!("> {}", entry),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(format!("  {}", entry), Style::default().fg(theme.dim)))
        };
        lines.push(line);
    }

    lines
}
