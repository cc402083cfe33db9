pub mod app;
pub mod components;
pub mod events;
pub mod markdown;
pub mod terminal;
pub mod theme;

pub use self::app::App;
pub use self::events::{Event, EventHandler};
pub use self::theme::Theme;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use csvchat::app::AppConfig;
use csvchat::chat::ChatSession;
use csvchat::error::Result;

use self::terminal::TerminalSession;

/// Runs the chat interface until the user quits.
pub async fn run(
    session: Arc<ChatSession>,
    config: &AppConfig,
    initial_file: Option<PathBuf>,
) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));
    let sender = events.sender();

    let mut app = App::new(session, sender.clone(), config);

    if let Some(path) = initial_file {
        let _ = sender.send(Event::AttachFile(path));
    }

    let mut terminal = TerminalSession::new()?;

    while !app.should_quit() {
        terminal.draw(|frame| app.render(frame))?;

        if let Some(event) = events.next().await {
            app.handle_event(event).await;
        }
    }

    Ok(())
}
