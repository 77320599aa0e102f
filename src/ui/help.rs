use super::centered_rect;
use crate::app::View;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn binding(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {:<12}", keys), Style::default().fg(Color::Yellow)),
        Span::raw(action),
    ])
}

pub fn render(view: View, frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let mut help_text = vec![
        Line::from(""),
        section("  Global"),
        binding("?", "Toggle this help"),
        binding("q", "Quit application"),
        binding("Ctrl+C", "Quit from anywhere"),
        Line::from(""),
    ];

    match view {
        View::Catalog => help_text.extend([
            section("  Catalog"),
            binding("↑/k ↓/j", "Navigate results"),
            binding("PgUp/PgDn", "Scroll a page"),
            binding("/", "Search code, message, cause and action"),
            binding("p / P", "Next / previous platform"),
            binding("Esc", "Clear search and platform"),
            binding("r", "Reload from source"),
            binding("a", "Open admin (login required)"),
        ]),
        View::Admin => help_text.extend([
            section("  Admin table"),
            binding("↑/↓", "Select error code"),
            binding("e / Enter", "Edit selected code"),
            binding("d", "Delete selected code"),
            binding("n / Tab", "Focus the form"),
            binding("r", "Reload"),
            binding("L", "Log out"),
            binding("v / Esc", "Back to catalog"),
            Line::from(""),
            section("  Admin form"),
            binding("Tab/↓", "Next field"),
            binding("S-Tab/↑", "Previous field"),
            binding("Enter", "Add or update"),
            binding("Esc", "Cancel edit and focus the table"),
        ]),
    }
    help_text.push(Line::from(""));

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press ? or Esc to close ").style(Style::default().fg(Color::DarkGray))),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
