use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::tui::{components::Component, Event, Theme};

#[derive(Debug, Clone)]
pub struct InputBox {
    input: Input,
    is_focused: bool,
    placeholder: String,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            is_focused: false,
            placeholder: "Ask about the attached file... (Enter: send)".to_string(),
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.is_focused
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn get_content(&self) -> String {
        self.input.value().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().trim().is_empty()
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Message ");

        // Width available for text inside the borders.
        let available_width = area.width.saturating_sub(2) as usize;

        if self.input.value().is_empty() {
            let content = Line::from(Span::styled(&self.placeholder, theme.secondary()));
            let paragraph = Paragraph::new(content).block(block).style(theme.normal());
            frame.render_widget(paragraph, area);
            if self.is_focused {
                frame.set_cursor(area.x + 1, area.y + 1);
            }
            return;
        }

        let cursor_pos = self.input.visual_cursor();

        // Scroll horizontally so the cursor stays in view.
        let scroll_offset = if cursor_pos >= available_width {
            cursor_pos.saturating_sub(available_width) + 1
        } else {
            0
        };

        let chars: Vec<char> = self.input.value().chars().collect();
        let start = scroll_offset.min(chars.len());
        let end = (start + available_width).min(chars.len());
        let visible_text: String = chars[start..end].iter().collect();

        let cursor_in_view = cursor_pos.saturating_sub(scroll_offset);

        let paragraph = Paragraph::new(Line::from(visible_text))
            .block(block)
            .style(theme.normal());
        frame.render_widget(paragraph, area);

        if self.is_focused {
            let cursor_x = area.x + 1 + cursor_in_view as u16;
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width - 1 {
                frame.set_cursor(cursor_x, cursor_y);
            }
        }
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(key) => match key.code {
                KeyCode::Enter => false, // Let parent handle send
                _ => {
                    // Let global hotkeys pass through.
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        || key.modifiers.contains(KeyModifiers::ALT)
                    {
                        false
                    } else {
                        self.input
                            .handle_event(&crossterm::event::Event::Key(*key));
                        true
                    }
                }
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_typing_requires_focus() {
        let mut input = InputBox::new();
        assert!(!input.handle_event(&key(KeyCode::Char('h'))));
        assert!(input.is_empty());

        input.focus();
        assert!(input.handle_event(&key(KeyCode::Char('h'))));
        assert!(input.handle_event(&key(KeyCode::Char('i'))));
        assert_eq!(input.get_content(), "hi");
    }

    #[test]
    fn test_enter_is_left_to_parent() {
        let mut input = InputBox::new();
        input.focus();
        input.handle_event(&key(KeyCode::Char('x')));
        assert!(!input.handle_event(&key(KeyCode::Enter)));
        assert_eq!(input.get_content(), "x");
    }

    #[test]
    fn test_clear_resets_content() {
        let mut input = InputBox::new();
        input.focus();
        input.handle_event(&key(KeyCode::Char('x')));
        input.clear();
        assert!(input.is_empty());
    }
}
