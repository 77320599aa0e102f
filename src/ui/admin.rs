use super::truncate_str;
use crate::app::{AdminFocus, App};
use crate::form::Field;
use crate::store::LoadState;
use crate::view::{NO_CODES, ResultsView};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

/// Label column width in the form.
const LABEL_WIDTH: usize = 13;

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    // Layout: header(3) + form(9) + table(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header ──
    let refreshed = app
        .store
        .refreshed_at()
        .map(|t| format!("   refreshed {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let header = Paragraph::new(format!(
        " Error Code Admin   [{} codes]{}",
        app.table.len(),
        refreshed
    ))
    .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, chunks[0]);

    render_form(app, frame, chunks[1]);
    render_table(app, frame, chunks[2]);

    // ── Status bar ──
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let mut spans = match app.admin_focus {
        AdminFocus::Table => vec![
            key(" ↑↓"),
            Span::raw(" Select  "),
            key("e"),
            Span::raw(" Edit  "),
            key("d"),
            Span::raw(" Delete  "),
            key("n"),
            Span::raw(" New  "),
            key("L"),
            Span::raw(" Logout  "),
            key("v"),
            Span::raw(" Catalog  "),
        ],
        AdminFocus::Form => vec![
            key(" Tab"),
            Span::raw(" Next field  "),
            key("Enter"),
            Span::raw(" Submit  "),
            key("Esc"),
            Span::raw(" Table  "),
        ],
    };
    if app.is_busy() {
        spans.push(Span::styled("⟳ ", Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::styled(app.status_msg.as_str(), Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[3]);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let form = &app.form;
    let focused = app.admin_focus == AdminFocus::Form;
    let border = if focused { Color::Yellow } else { Color::DarkGray };

    let mut lines: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let label = format!(" {:<width$}", format!("{}:", field.label()), width = LABEL_WIDTH);
            let value_style = if !form.is_enabled(field) {
                Style::default().fg(Color::DarkGray)
            } else if focused && form.focus() == field {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if focused && form.focus() == field { "▸" } else { " " };
            Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(label, Style::default().fg(Color::Cyan)),
                Span::styled(form.value(field), value_style),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    let mut actions = vec![Span::styled(
        format!(" [Enter] {} ", form.submit_label()),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )];
    if form.is_editing() {
        actions.push(Span::styled(" [Esc] Cancel", Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(actions));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {} ", form.title()));
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if focused && form.is_enabled(form.focus()) {
        let row = Field::ALL.iter().position(|&f| f == form.focus()).unwrap_or(0) as u16;
        let value_width = unicode_width::UnicodeWidthStr::width(form.value(form.focus())) as u16;
        let x = area.x + 1 + 1 + 1 + LABEL_WIDTH as u16 + value_width;
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1 + row));
    }
}

fn render_table(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.admin_focus == AdminFocus::Table;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }))
        .title(" Existing Error Codes ");

    // A failed load must not read as an empty catalog
    if let (LoadState::Failed(_), ResultsView::Failed(message)) = (app.store.state(), &app.results) {
        let p = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(p, area);
        return;
    }

    if app.table.is_empty() {
        let p = Paragraph::new(NO_CODES)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(p, area);
        return;
    }

    let message_width = (area.width as usize).saturating_sub(40);
    let rows: Vec<Row> = app
        .table
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.code.as_str()),
                Cell::from(truncate_str(&row.hmi_message, message_width)),
                Cell::from(row.platforms.as_str()),
            ])
        })
        .collect();

    let header = Row::new(vec!["Code", "HMI Message", "Platforms"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Min(20), Constraint::Length(24)],
    )
    .header(header)
    .block(block.title_bottom(
        Line::from(format!(" {} of {} ", app.table_selected + 1, app.table.len())).alignment(Alignment::Right),
    ))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("▸ ");

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.table_selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::View;
    use crate::model::ErrorRecord;
    use crate::view::LOAD_FAILED;
    use ratatui::{Terminal, backend::TestBackend};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn admin_app() -> App {
        let mut app = App::new(None, true);
        app.authenticated = true;
        app.view = View::Admin;
        app
    }

    #[test]
    fn test_failed_load_shows_error_instead_of_empty_table() {
        let mut app = admin_app();
        app.store.fail("HTTP 500: boom".to_string());
        app.refresh_views();

        let text = screen(&app);
        assert!(text.contains(LOAD_FAILED), "{text}");
        assert!(!text.contains(NO_CODES));
    }

    #[test]
    fn test_empty_catalog_shows_placeholder() {
        let mut app = admin_app();
        app.store.replace(Vec::new());
        app.refresh_views();

        let text = screen(&app);
        assert!(text.contains(NO_CODES));
        assert!(!text.contains(LOAD_FAILED));
    }

    #[test]
    fn test_table_lists_codes_in_numeric_order() {
        let mut app = admin_app();
        app.store.replace(vec![
            ErrorRecord {
                code: "100".to_string(),
                hmi_message: "Rad blockiert".to_string(),
                ..Default::default()
            },
            ErrorRecord {
                code: "7".to_string(),
                hmi_message: "Eingeschlossen".to_string(),
                ..Default::default()
            },
        ]);
        app.refresh_views();

        let text = screen(&app);
        let seven = text.find("Eingeschlossen").unwrap();
        let hundred = text.find("Rad blockiert").unwrap();
        assert!(seven < hundred);
    }
}
