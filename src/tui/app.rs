use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use csvchat::app::AppConfig;
use csvchat::chat::{AttachedFile, ChatSession, TranscriptMessage};

use crate::tui::components::file_prompt::PromptAction;
use crate::tui::components::status_bar::Activity;
use crate::tui::components::{ChatView, Component, FilePrompt, HelpPopup, InputBox, StatusBar};
use crate::tui::{Event, Theme};

#[derive(Clone, Debug, PartialEq)]
pub enum FocusedPanel {
    ChatView,
    InputBox,
}

pub struct App {
    // Components
    chat_view: ChatView,
    input_box: InputBox,
    status_bar: StatusBar,
    help_popup: HelpPopup,
    file_prompt: FilePrompt,

    // State
    focused_panel: FocusedPanel,
    theme: Theme,
    should_quit: bool,
    busy: bool,
    attached: Option<AttachedFile>,

    // Backend integration
    session: Arc<ChatSession>,
    event_sender: mpsc::UnboundedSender<Event>,
}

impl App {
    pub fn new(
        session: Arc<ChatSession>,
        event_sender: mpsc::UnboundedSender<Event>,
        config: &AppConfig,
    ) -> Self {
        let mut status_bar = StatusBar::new();
        status_bar.set_model_info(&config.service.model);

        let mut app = Self {
            chat_view: ChatView::new(),
            input_box: InputBox::new(),
            status_bar,
            help_popup: HelpPopup::new(),
            file_prompt: FilePrompt::new(),
            focused_panel: FocusedPanel::InputBox,
            theme: Theme::from_name(&config.ui.theme),
            should_quit: false,
            busy: false,
            attached: None,
            session,
            event_sender,
        };

        app.update_focus();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn attached_file(&self) -> Option<&AttachedFile> {
        self.attached.as_ref()
    }

    pub async fn handle_event(&mut self, event: Event) {
        // Help popup takes priority
        if self.help_popup.is_visible() && self.help_popup.handle_event(&event) {
            return;
        }

        // File prompt takes priority over normal panel handling
        if self.file_prompt.is_visible() {
            if let Event::Key(key) = event {
                if let PromptAction::Submitted(path) = self.file_prompt.handle_key(key) {
                    let _ = self.event_sender.send(Event::AttachFile(path));
                }
                return;
            }
        }

        match event {
            Event::Key(key) => {
                if self.handle_global_keys(key) {
                    return;
                }
                self.handle_panel_keys(key);
            }
            Event::SendMessage(content) => {
                self.send_message(content);
            }
            Event::AttachFile(path) => {
                self.attach_file(path);
            }
            Event::FileAttached(file) => {
                self.busy = false;
                self.status_bar.set_activity(Activity::Idle);
                self.status_bar.set_file_info(&file.filename);
                self.status_bar.set_status("File uploaded and chat reset");
                self.chat_view.push_message(TranscriptMessage::notice(format!(
                    "Ingested {} ({} bytes). Ask away.",
                    file.filename, file.size
                )));
                self.attached = Some(file);
            }
            Event::ReplyReceived(replies) => {
                self.busy = false;
                self.status_bar.set_activity(Activity::Idle);
                self.status_bar.set_status("Ready");
                for reply in replies {
                    self.chat_view.push_message(reply);
                }
            }
            Event::RunStatusChanged(status) => {
                self.status_bar
                    .set_activity(Activity::Running(status.to_string()));
            }
            Event::Error(message) => {
                self.busy = false;
                self.status_bar.set_activity(Activity::Failed);
                self.status_bar.set_status(format!("Error: {}", message));
                self.chat_view
                    .push_message(TranscriptMessage::notice(format!("Error: {}", message)));
            }
            Event::StatusUpdate(status) => {
                self.status_bar.set_status(status);
            }
            _ => {}
        }
    }

    fn handle_global_keys(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                true
            }
            (KeyCode::F(1), _) => {
                self.help_popup.toggle();
                true
            }
            (KeyCode::Char('o'), KeyModifiers::CONTROL) => {
                if self.busy {
                    self.status_bar
                        .set_status("Wait for the current operation to finish");
                } else {
                    self.file_prompt.show();
                }
                true
            }
            (KeyCode::Tab, KeyModifiers::NONE) | (KeyCode::BackTab, _) => {
                self.next_panel();
                true
            }
            _ => false,
        }
    }

    fn handle_panel_keys(&mut self, key: KeyEvent) {
        let event = Event::Key(key);
        match self.focused_panel {
            FocusedPanel::ChatView => {
                self.chat_view.handle_event(&event);
            }
            FocusedPanel::InputBox => {
                if self.input_box.handle_event(&event) {
                    return;
                }
                if key.code == KeyCode::Enter {
                    self.submit_input();
                }
            }
        }
    }

    fn submit_input(&mut self) {
        if self.input_box.is_empty() {
            return;
        }
        let content = self.input_box.get_content();
        self.input_box.clear();
        let _ = self.event_sender.send(Event::SendMessage(content));
    }

    fn send_message(&mut self, content: String) {
        if self.busy {
            self.status_bar
                .set_status("Still waiting on the previous request");
            return;
        }
        if self.attached.is_none() {
            self.status_bar
                .set_status("Attach a file first (Ctrl+O)");
            return;
        }

        debug!("Dispatching user message ({} chars)", content.len());

        self.busy = true;
        self.status_bar
            .set_activity(Activity::Running("queued".to_string()));
        self.status_bar.set_status("Waiting for the assistant...");
        self.chat_view
            .push_message(TranscriptMessage::user(content.clone()));

        let session = self.session.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let status_sender = sender.clone();
            let result = session
                .ask(&content, move |status| {
                    let _ = status_sender.send(Event::RunStatusChanged(status));
                })
                .await;

            match result {
                Ok(replies) => {
                    let _ = sender.send(Event::ReplyReceived(replies));
                }
                Err(e) => {
                    let _ = sender.send(Event::Error(e.to_string()));
                }
            }
        });
    }

    fn attach_file(&mut self, path: PathBuf) {
        if self.busy {
            self.status_bar
                .set_status("Wait for the current operation to finish");
            return;
        }

        debug!("Dispatching file attach: {:?}", path);

        self.busy = true;
        self.status_bar.set_activity(Activity::Uploading);
        self.status_bar
            .set_status(format!("Uploading {}...", path.display()));

        let session = self.session.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            match session.attach_file(&path).await {
                Ok(file) => {
                    let _ = sender.send(Event::FileAttached(file));
                }
                Err(e) => {
                    let _ = sender.send(Event::Error(e.to_string()));
                }
            }
        });
    }

    fn next_panel(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::ChatView => FocusedPanel::InputBox,
            FocusedPanel::InputBox => FocusedPanel::ChatView,
        };
        self.update_focus();
    }

    fn update_focus(&mut self) {
        match self.focused_panel {
            FocusedPanel::ChatView => {
                self.chat_view.focus();
                self.input_box.unfocus();
            }
            FocusedPanel::InputBox => {
                self.chat_view.unfocus();
                self.input_box.focus();
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(2),
            ])
            .split(area);

        self.chat_view.render(frame, chunks[0], &self.theme);
        self.input_box.render(frame, chunks[1], &self.theme);
        self.status_bar.render(frame, chunks[2], &self.theme);

        self.file_prompt.render(frame, area, &self.theme);
        self.help_popup.render(frame, area, &self.theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvchat::assistant::AssistantClient;

    fn test_app() -> App {
        let config = AppConfig::default();
        let client = Arc::new(
            AssistantClient::with_base_url(
                "sk-test".to_string(),
                "http://127.0.0.1:1".to_string(),
                1,
            )
            .unwrap(),
        );
        let session = Arc::new(ChatSession::new(client, &config));
        let (sender, _receiver) = mpsc::unbounded_channel();
        App::new(session, sender, &config)
    }

    #[tokio::test]
    async fn test_send_without_file_is_gated() {
        let mut app = test_app();
        app.handle_event(Event::SendMessage("hello".to_string())).await;
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_file_attached_updates_state() {
        let mut app = test_app();
        app.handle_event(Event::FileAttached(AttachedFile {
            file_id: "file-1".to_string(),
            filename: "data.csv".to_string(),
            size: 12,
        }))
        .await;

        assert!(!app.is_busy());
        assert_eq!(app.attached_file().unwrap().filename, "data.csv");
    }

    #[tokio::test]
    async fn test_error_clears_busy() {
        let mut app = test_app();
        app.handle_event(Event::FileAttached(AttachedFile {
            file_id: "file-1".to_string(),
            filename: "data.csv".to_string(),
            size: 12,
        }))
        .await;

        // A dispatched message marks the app busy.
        app.handle_event(Event::SendMessage("hello".to_string())).await;
        assert!(app.is_busy());

        app.handle_event(Event::Error("boom".to_string())).await;
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = test_app();
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::CONTROL,
        )))
        .await;
        assert!(app.should_quit());
    }
}
