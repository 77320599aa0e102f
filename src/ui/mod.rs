mod admin;
pub mod backdrop;
mod dialog;
mod help;
mod list;
pub mod password_overlay;

use crate::app::{App, View};
use backdrop::Backdrop;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

/// Top-level render dispatch.
pub fn render(app: &App, backdrop: Option<&dyn Backdrop>, frame: &mut Frame) {
    match app.view {
        View::Catalog => list::render(app, backdrop, frame),
        View::Admin => admin::render(app, frame),
    }

    // Overlays, topmost last
    if app.show_help {
        help::render(app.view, frame);
    }
    if let Some(dialog) = &app.dialog {
        dialog::render(dialog, frame);
    }
    if let Some(login) = &app.login {
        login.render(frame);
    }
}

/// Create a centered rectangle using percentage of parent area.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Truncate a string to `max_width` display columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut result = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push('…');
    result
}
