use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

use csvchat::assistant::RunStatus;
use csvchat::chat::{AttachedFile, TranscriptMessage};

#[derive(Clone, Debug)]
pub enum Event {
    /// Terminal tick event
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Mouse event
    #[allow(dead_code)]
    Mouse(MouseEvent),
    /// Terminal resize event
    #[allow(dead_code)]
    Resize(u16, u16),
    /// User submitted a question
    SendMessage(String),
    /// User asked for a file to be ingested
    AttachFile(PathBuf),
    /// Background upload finished
    FileAttached(AttachedFile),
    /// Run completed; the assistant's messages for that run
    ReplyReceived(Vec<TranscriptMessage>),
    /// Run moved to a new lifecycle status
    RunStatusChanged(RunStatus),
    /// Background operation failed
    Error(String),
    /// Free-form status bar update
    StatusUpdate(String),
}

pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
    last_tick: Instant,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            last_tick: Instant::now(),
            tick_rate,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        // App events from background tasks take priority.
        if let Ok(event) = timeout(Duration::from_millis(10), self.receiver.recv()).await {
            return event;
        }

        // Check for terminal events
        if event::poll(Duration::from_millis(0)).unwrap_or(false) {
            match event::read() {
                Ok(CrosstermEvent::Key(key)) => return Some(Event::Key(key)),
                Ok(CrosstermEvent::Mouse(mouse)) => return Some(Event::Mouse(mouse)),
                Ok(CrosstermEvent::Resize(w, h)) => return Some(Event::Resize(w, h)),
                _ => {}
            }
        }

        // Send tick event if enough time has passed
        if self.last_tick.elapsed() >= self.tick_rate {
            self.last_tick = Instant::now();
            return Some(Event::Tick);
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(10)).await;
        None
    }
}
