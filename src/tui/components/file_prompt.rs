use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::path::PathBuf;
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::tui::Theme;

/// Outcome of feeding a key press to the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptAction {
    Pending,
    Submitted(PathBuf),
    Cancelled,
}

/// Modal path entry for attaching a file.
pub struct FilePrompt {
    input: Input,
    is_visible: bool,
}

impl FilePrompt {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            is_visible: false,
        }
    }

    pub fn show(&mut self) {
        self.input.reset();
        self.is_visible = true;
    }

    pub fn hide(&mut self) {
        self.is_visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Esc => {
                self.hide();
                PromptAction::Cancelled
            }
            KeyCode::Enter => {
                let value = self.input.value().trim().to_string();
                if value.is_empty() {
                    return PromptAction::Pending;
                }
                self.hide();
                PromptAction::Submitted(PathBuf::from(value))
            }
            _ => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.input.handle_event(&crossterm::event::Event::Key(key));
                }
                PromptAction::Pending
            }
        }
    }

    fn centered_rect(area: Rect) -> Rect {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(15),
                Constraint::Percentage(70),
                Constraint::Percentage(15),
            ])
            .split(vertical[1])[1]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if !self.is_visible {
            return;
        }

        let popup_area = Self::centered_rect(area);
        frame.render_widget(Clear, popup_area);

        let content = if self.input.value().is_empty() {
            Line::from(Span::styled(
                "Path to a .csv or .txt file",
                theme.secondary(),
            ))
        } else {
            Line::from(self.input.value().to_string())
        };

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.accent())
                    .title(" Attach file (Enter: upload, Esc: cancel) "),
            )
            .style(theme.normal());

        frame.render_widget(paragraph, popup_area);

        let cursor_x = popup_area.x + 1 + self.input.visual_cursor() as u16;
        if cursor_x < popup_area.x + popup_area.width - 1 {
            frame.set_cursor(cursor_x, popup_area.y + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_submit_returns_typed_path() {
        let mut prompt = FilePrompt::new();
        prompt.show();

        for c in "/tmp/data.csv".chars() {
            assert_eq!(prompt.handle_key(key(KeyCode::Char(c))), PromptAction::Pending);
        }
        let action = prompt.handle_key(key(KeyCode::Enter));
        assert_eq!(action, PromptAction::Submitted(PathBuf::from("/tmp/data.csv")));
        assert!(!prompt.is_visible());
    }

    #[test]
    fn test_empty_submit_stays_open() {
        let mut prompt = FilePrompt::new();
        prompt.show();
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptAction::Pending);
        assert!(prompt.is_visible());
    }

    #[test]
    fn test_escape_cancels() {
        let mut prompt = FilePrompt::new();
        prompt.show();
        prompt.handle_key(key(KeyCode::Char('x')));
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), PromptAction::Cancelled);
        assert!(!prompt.is_visible());
    }

    #[test]
    fn test_show_clears_previous_input() {
        let mut prompt = FilePrompt::new();
        prompt.show();
        prompt.handle_key(key(KeyCode::Char('x')));
        prompt.handle_key(key(KeyCode::Esc));

        prompt.show();
        let action = prompt.handle_key(key(KeyCode::Enter));
        // Previous "x" must not leak into the new prompt.
        assert_eq!(action, PromptAction::Pending);
    }
}
