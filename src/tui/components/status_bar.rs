use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::{components::Component, Event, Theme};

/// What the application is doing right now, for the activity indicator.
#[derive(Clone, Debug, PartialEq)]
pub enum Activity {
    Idle,
    Uploading,
    /// A run is in flight; carries the service-reported status.
    Running(String),
    Failed,
}

pub struct StatusBar {
    status_message: String,
    model_info: String,
    file_info: String,
    activity: Activity,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            status_message: "Ready".to_string(),
            model_info: "no model".to_string(),
            file_info: "no file attached".to_string(),
            activity: Activity::Idle,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    pub fn set_model_info(&mut self, model: &str) {
        self.model_info = model.to_string();
    }

    pub fn set_file_info(&mut self, filename: &str) {
        self.file_info = filename.to_string();
    }

    pub fn set_activity(&mut self, activity: Activity) {
        self.activity = activity;
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    fn indicator(&self, theme: &Theme) -> (String, Style, String) {
        match &self.activity {
            Activity::Idle => ("○".to_string(), theme.secondary(), "idle".to_string()),
            Activity::Uploading => ("◐".to_string(), theme.warning(), "uploading".to_string()),
            Activity::Running(status) => ("●".to_string(), theme.warning(), status.clone()),
            Activity::Failed => ("●".to_string(), theme.error(), "error".to_string()),
        }
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let (symbol, symbol_style, activity_text) = self.indicator(theme);

        let status_line = Line::from(vec![
            Span::styled(&self.status_message, theme.normal()),
            Span::raw(" | "),
            Span::styled(&self.model_info, theme.accent()),
            Span::raw(" | "),
            Span::styled(&self.file_info, theme.success()),
            Span::raw(" | "),
            Span::styled(symbol, symbol_style),
            Span::raw(" "),
            Span::styled(activity_text, theme.secondary()),
            Span::raw(" | "),
            Span::styled("F1: Help", theme.secondary()),
            Span::raw(" | "),
            Span::styled("Ctrl+Q: Quit", theme.secondary()),
        ]);

        let paragraph = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::TOP).border_style(theme.border()))
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, _event: &Event) -> bool {
        false // Status bar doesn't handle events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_transitions() {
        let mut bar = StatusBar::new();
        assert_eq!(*bar.activity(), Activity::Idle);

        bar.set_activity(Activity::Running("in_progress".to_string()));
        assert_eq!(*bar.activity(), Activity::Running("in_progress".to_string()));

        bar.set_activity(Activity::Idle);
        assert_eq!(*bar.activity(), Activity::Idle);
    }
}
