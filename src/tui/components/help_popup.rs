use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

use crate::tui::{components::Component, Event, Theme};

pub struct HelpPopup {
    is_visible: bool,
}

impl HelpPopup {
    pub fn new() -> Self {
        Self { is_visible: false }
    }

    pub fn hide(&mut self) {
        self.is_visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn toggle(&mut self) {
        self.is_visible = !self.is_visible;
    }

    fn get_help_content() -> Vec<(&'static str, &'static str)> {
        vec![
            ("File", ""),
            ("  Ctrl+O", "Attach a CSV/text file"),
            ("", ""),
            ("Chat", ""),
            ("  Enter", "Send message"),
            ("  Tab / Shift+Tab", "Switch between transcript and input"),
            ("  Up/Down, PgUp/PgDn", "Scroll the transcript"),
            ("  Home/End", "Jump to top/bottom of the transcript"),
            ("", ""),
            ("General", ""),
            ("  F1", "Show/hide this help"),
            ("  Ctrl+C / Ctrl+Q", "Quit application"),
        ]
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

impl Component for HelpPopup {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if !self.is_visible {
            return;
        }

        let popup_area = Self::centered_rect(60, 60, area);

        // Clear the area
        frame.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = Self::get_help_content()
            .iter()
            .map(|(key, description)| {
                if key.is_empty() {
                    ListItem::new(Line::from(""))
                } else if description.is_empty() {
                    // Section header
                    ListItem::new(Line::from(Span::styled(
                        *key,
                        theme.accent().add_modifier(Modifier::BOLD),
                    )))
                } else {
                    ListItem::new(Line::from(vec![
                        Span::styled(*key, theme.highlight()),
                        Span::raw(": "),
                        Span::styled(*description, theme.normal()),
                    ]))
                }
            })
            .collect();

        let help_list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.accent())
                    .title(" Help - Press F1 or Esc to close "),
            )
            .style(theme.normal());

        frame.render_widget(help_list, popup_area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_visible {
            return false;
        }

        match event {
            Event::Key(key) => {
                match key.code {
                    KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
                        self.hide();
                        true
                    }
                    _ => true, // Consume all events when visible
                }
            }
            _ => true,
        }
    }
}
