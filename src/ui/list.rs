use super::backdrop::Backdrop;
use super::truncate_str;
use crate::app::{App, InputMode};
use crate::store::LoadState;
use crate::view::{NO_RESULTS, ResultsView};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

const BANNER_HEIGHT: u16 = 7;

pub fn render(app: &App, backdrop: Option<&dyn Backdrop>, frame: &mut Frame) {
    let area = frame.area();
    let banner = if backdrop.is_some() && area.height > 30 { BANNER_HEIGHT } else { 0 };

    // Layout: banner + header(3) + filter(3) + results(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(backdrop) = backdrop.filter(|_| banner > 0) {
        backdrop.draw(frame, chunks[0]);
    }

    // ── Header ──
    let loading = if matches!(app.store.state(), LoadState::Loading) { "  ⟳ loading" } else { "" };
    let header_text = format!(
        " Error Code Explorer   [{} of {} codes]{}",
        app.filtered_indices.len(),
        app.store.records().len(),
        loading
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(header, chunks[1]);

    // ── Filter bar ──
    let filter_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(Color::DarkGray),
    };
    let filter_label = if app.input_mode == InputMode::Editing {
        " 🔍 Search (Enter/Esc to finish): "
    } else {
        " 🔍 Search (/): "
    };
    let platform = app.query.platform.as_deref().unwrap_or("all");
    let filter_bar = Paragraph::new(format!("{}{}", filter_label, app.query.text))
        .style(filter_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(filter_style)
                .title(" Search ")
                .title_top(Line::from(format!(" Platform: {} (p/P) ", platform)).alignment(Alignment::Right)),
        );
    frame.render_widget(filter_bar, chunks[2]);

    if app.input_mode == InputMode::Editing {
        let cursor_x = chunks[2].x
            + unicode_width::UnicodeWidthStr::width(filter_label) as u16
            + unicode_width::UnicodeWidthStr::width(app.query.text.as_str()) as u16;
        frame.set_cursor_position((cursor_x, chunks[2].y + 1));
    }

    // ── Results ──
    let results_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Error Codes ");

    match &app.results {
        ResultsView::Loading => {
            let p = Paragraph::new("Loading...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(results_block);
            frame.render_widget(p, chunks[3]);
        }
        ResultsView::Failed(message) => {
            let p = Paragraph::new(message.as_str())
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(results_block);
            frame.render_widget(p, chunks[3]);
        }
        ResultsView::Empty => {
            let p = Paragraph::new(NO_RESULTS)
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(results_block);
            frame.render_widget(p, chunks[3]);
        }
        ResultsView::Cards(cards) => {
            let revealed = app.results.revealed(app.rendered_at.elapsed());
            let width = (area.width as usize).saturating_sub(16);
            let items: Vec<ListItem> = cards
                .iter()
                .take(revealed)
                .map(|card| {
                    let text = Text::from(vec![
                        Line::from(Span::styled(
                            truncate_str(&card.headline, width + 12),
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                        )),
                        Line::from(vec![
                            Span::styled("  Cause:  ", Style::default().fg(Color::DarkGray)),
                            Span::raw(truncate_str(&card.cause, width)),
                        ]),
                        Line::from(vec![
                            Span::styled("  Action: ", Style::default().fg(Color::DarkGray)),
                            Span::raw(truncate_str(&card.action, width)),
                        ]),
                        Line::from(vec![
                            Span::styled("  Platforms: ", Style::default().fg(Color::DarkGray)),
                            Span::styled(card.platforms.as_str(), Style::default().fg(Color::DarkGray)),
                        ]),
                    ]);
                    ListItem::new(text)
                })
                .collect();

            let page_info = format!(
                " {} of {} ",
                (app.list_selected + 1).min(cards.len()),
                cards.len()
            );
            let list_widget = List::new(items)
                .block(results_block.title_bottom(Line::from(page_info).alignment(Alignment::Right)))
                .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                .highlight_symbol("▸ ");

            let mut list_state = ListState::default();
            if app.list_selected < revealed {
                list_state.select(Some(app.list_selected));
            }
            frame.render_stateful_widget(list_widget, chunks[3], &mut list_state);
        }
    }

    // ── Status bar ──
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let mut spans = vec![
        key(" ↑↓"),
        Span::raw(" Navigate  "),
        key("/"),
        Span::raw(" Search  "),
        key("p"),
        Span::raw(" Platform  "),
    ];
    if app.writable {
        spans.push(key("a"));
        spans.push(Span::raw(" Admin  "));
    }
    spans.extend([
        key("?"),
        Span::raw(" Help  "),
        key("q"),
        Span::raw(" Quit  "),
        Span::styled(app.status_msg.as_str(), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[4]);
}
