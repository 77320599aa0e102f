use super::centered_rect;
use crate::app::Dialog;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Render a blocking alert or confirmation popup
pub fn render(dialog: &Dialog, frame: &mut Frame) {
    let area = centered_rect(60, 30, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    match dialog {
        Dialog::Alert(message) => render_alert(message, frame, area),
        Dialog::ConfirmDelete { code } => render_confirmation(code, frame, area),
    }
}

fn render_alert(message: &str, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from("Press Enter or Esc to dismiss"),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_confirmation(code: &str, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Confirm Delete ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let text = vec![
        Line::from(""),
        Line::from(format!("Are you sure you want to delete error code {}?", code)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("es / "),
            Span::styled("N", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("o"),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
