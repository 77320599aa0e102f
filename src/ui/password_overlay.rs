use super::{centered_rect, truncate_str};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

/// What the admin did with the login prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordInputResult {
    Submit(String),
    Cancel,
}

/// Masked password prompt guarding the admin view. It names the catalog
/// service it logs into and counts rejected attempts.
#[derive(Debug)]
pub struct PasswordInputOverlay {
    secret: String,
    prompt: String,
    /// Service the session is opened against
    target: Option<String>,
    /// Why the prompt opened, e.g. an expired session
    notice: Option<String>,
    rejection: Option<String>,
    failures: u32,
}

impl PasswordInputOverlay {
    pub fn new(prompt: String) -> Self {
        Self {
            secret: String::new(),
            prompt,
            target: None,
            notice: None,
            rejection: None,
            failures: 0,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.trim()).filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn with_notice(mut self, notice: String) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failures
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PasswordInputResult> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(PasswordInputResult::Cancel),
                KeyCode::Char('u') => {
                    self.secret.clear();
                    None
                }
                _ => None,
            };
        }
        match key.code {
            KeyCode::Esc => Some(PasswordInputResult::Cancel),
            KeyCode::Enter if self.secret.is_empty() => None,
            KeyCode::Enter => Some(PasswordInputResult::Submit(std::mem::take(&mut self.secret))),
            KeyCode::Backspace => {
                self.secret.pop();
                None
            }
            KeyCode::Char(c) => {
                self.secret.push(c);
                None
            }
            _ => None,
        }
    }

    /// Record a rejected login. The buffer is cleared for the next try.
    pub fn set_error(&mut self, message: String) {
        self.failures += 1;
        self.rejection = Some(message);
        self.notice = None;
        self.secret.clear();
    }

    fn status_line(&self) -> Line<'_> {
        match (&self.rejection, &self.notice) {
            (Some(rejection), _) => {
                let mut spans = vec![Span::styled(rejection.as_str(), Style::default().fg(Color::Red))];
                if self.failures > 1 {
                    spans.push(Span::styled(
                        format!(" (attempt {})", self.failures),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                Line::from(spans)
            }
            (None, Some(notice)) => Line::styled(notice.as_str(), Style::default().fg(Color::Yellow)),
            (None, None) => Line::styled("Enter log in · Esc cancel · Ctrl+U clear", Style::default().fg(Color::DarkGray)),
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = centered_rect(60, 30, frame.area());
        frame.render_widget(Clear, area);

        let accent = if self.rejection.is_some() { Color::Red } else { Color::Yellow };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .title_top(Line::from(" Admin Login ").alignment(Alignment::Left));
        if let Some(target) = &self.target {
            let width = (area.width as usize).saturating_sub(6);
            block = block.title_bottom(
                Line::styled(format!(" {} ", truncate_str(target, width)), Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Right),
            );
        }

        let masked = "•".repeat(self.secret.chars().count());
        let lines = vec![
            Line::from(self.prompt.as_str()),
            Line::from(""),
            Line::from(vec![
                Span::styled("▸ ", Style::default().fg(accent)),
                Span::styled(masked, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled("▏", Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
            self.status_line(),
        ];

        let body = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(body, area);
    }
}
