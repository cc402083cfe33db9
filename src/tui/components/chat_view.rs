use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use csvchat::chat::{MessageRole, TranscriptMessage};

use crate::tui::{components::Component, markdown, Event, Theme};

/// Append-only transcript panel.
pub struct ChatView {
    messages: Vec<TranscriptMessage>,
    is_focused: bool,
    auto_scroll: bool,
    scroll_offset: usize,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            is_focused: false,
            auto_scroll: true,
            scroll_offset: 0,
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    pub fn push_message(&mut self, message: TranscriptMessage) {
        self.messages.push(message);
        if self.auto_scroll {
            self.scroll_to_bottom();
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
        self.auto_scroll = false;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset += 1;
        self.auto_scroll = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.auto_scroll = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = usize::MAX; // Clamped in render
        self.auto_scroll = true;
    }

    fn header_line(message: &TranscriptMessage, theme: &Theme) -> Line<'static> {
        let time = message.timestamp.format("%H:%M").to_string();
        let (label, style) = match message.role {
            MessageRole::User => ("You", theme.accent()),
            MessageRole::Assistant => ("Assistant", theme.success()),
            MessageRole::Notice => ("--", theme.secondary()),
        };

        Line::from(vec![
            Span::styled(label, style.add_modifier(ratatui::style::Modifier::BOLD)),
            Span::raw(" · "),
            Span::styled(time, theme.secondary()),
        ])
    }

    fn wrap_text(text: &str, width: usize) -> Vec<String> {
        if width < 10 {
            return vec![text.to_string()];
        }

        let mut lines = Vec::new();
        for line in text.lines() {
            if line.len() <= width {
                lines.push(line.to_string());
            } else {
                let mut current_line = String::new();
                for word in line.split_whitespace() {
                    if current_line.len() + word.len() < width {
                        if !current_line.is_empty() {
                            current_line.push(' ');
                        }
                        current_line.push_str(word);
                    } else {
                        if !current_line.is_empty() {
                            lines.push(current_line);
                        }
                        current_line = word.to_string();
                    }
                }
                if !current_line.is_empty() {
                    lines.push(current_line);
                }
            }
        }

        if lines.is_empty() {
            lines.push(String::new());
        }

        lines
    }

    fn build_lines(&self, theme: &Theme, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for message in &self.messages {
            lines.push(Self::header_line(message, theme));

            match message.role {
                // Assistant replies arrive as markdown.
                MessageRole::Assistant => {
                    lines.extend(markdown::render(&message.content, theme, width));
                }
                MessageRole::User => {
                    for text in Self::wrap_text(&message.content, width) {
                        lines.push(Line::from(Span::styled(text, theme.normal())));
                    }
                }
                MessageRole::Notice => {
                    for text in Self::wrap_text(&message.content, width) {
                        lines.push(Line::from(Span::styled(
                            text,
                            theme
                                .secondary()
                                .add_modifier(ratatui::style::Modifier::ITALIC),
                        )));
                    }
                }
            }

            lines.push(Line::from(""));
        }

        lines
    }
}

impl Component for ChatView {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };

        let width = area.width.saturating_sub(2) as usize;
        let height = area.height.saturating_sub(2) as usize;

        let lines = self.build_lines(theme, width.max(10));
        let max_offset = lines.len().saturating_sub(height);

        if self.auto_scroll {
            self.scroll_offset = max_offset;
        } else {
            self.scroll_offset = self.scroll_offset.min(max_offset);
        }

        let visible: Vec<Line> = lines
            .into_iter()
            .skip(self.scroll_offset)
            .take(height.max(1))
            .collect();

        let title = if self.messages.is_empty() {
            " Conversation (attach a file with Ctrl+O, then ask away) "
        } else {
            " Conversation "
        };

        let paragraph = Paragraph::new(visible)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            )
            .style(theme.normal());

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(key) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll_up();
                    true
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll_down();
                    true
                }
                KeyCode::PageUp => {
                    for _ in 0..10 {
                        self.scroll_up();
                    }
                    true
                }
                KeyCode::PageDown => {
                    for _ in 0..10 {
                        self.scroll_down();
                    }
                    true
                }
                KeyCode::Home => {
                    self.scroll_to_top();
                    true
                }
                KeyCode::End => {
                    self.scroll_to_bottom();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_build_lines_headers_and_content() {
        let mut view = ChatView::new();
        view.push_message(TranscriptMessage::user("How many rows?"));
        view.push_message(TranscriptMessage::assistant("There are **42** rows."));

        let theme = Theme::dark();
        let lines = view.build_lines(&theme, 60);
        let texts: Vec<String> = lines.iter().map(|l| line_text(l)).collect();

        assert!(texts[0].starts_with("You"));
        assert_eq!(texts[1], "How many rows?");
        assert!(texts.iter().any(|t| t.starts_with("Assistant")));
        assert!(texts.iter().any(|t| t.contains("There are 42 rows.")));
    }

    #[test]
    fn test_notices_are_rendered() {
        let mut view = ChatView::new();
        view.push_message(TranscriptMessage::notice("Ingested data.csv"));

        let theme = Theme::dark();
        let lines = view.build_lines(&theme, 60);
        assert!(lines.iter().any(|l| line_text(l).contains("Ingested data.csv")));
    }

    #[test]
    fn test_scrolling_disables_auto_scroll() {
        let mut view = ChatView::new();
        view.push_message(TranscriptMessage::user("one"));
        assert!(view.auto_scroll);

        view.scroll_up();
        assert!(!view.auto_scroll);

        view.scroll_to_bottom();
        assert!(view.auto_scroll);
    }

    #[test]
    fn test_long_user_message_wraps() {
        let long = "word ".repeat(50);
        let lines = ChatView::wrap_text(long.trim(), 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 20));
    }
}
