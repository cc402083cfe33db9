use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    User,
    Assistant,
    /// Local annotations: ingestion confirmations, surfaced errors.
    Notice,
}

/// One entry in the local conversation transcript. The transcript is
/// append-only; entries are never edited or removed once pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Identifier of the mirrored remote message, when one exists.
    pub remote_id: Option<String>,
    /// Run that produced this entry, for assistant replies.
    pub run_id: Option<String>,
}

impl TranscriptMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            remote_id: None,
            run_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Notice, content)
    }

    pub fn with_remote(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// The single file the assistant is currently provisioned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
}

/// Point-in-time view of the session for status display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub file: Option<AttachedFile>,
    pub assistant_id: Option<String>,
    pub thread_id: Option<String>,
    pub message_count: usize,
    pub model: String,
}

impl SessionSnapshot {
    pub fn chat_ready(&self) -> bool {
        self.file.is_some() && self.assistant_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_roles() {
        assert_eq!(TranscriptMessage::user("hi").role, MessageRole::User);
        assert_eq!(TranscriptMessage::assistant("ok").role, MessageRole::Assistant);
        assert_eq!(TranscriptMessage::notice("!").role, MessageRole::Notice);
    }

    #[test]
    fn test_remote_linkage() {
        let message = TranscriptMessage::assistant("answer")
            .with_remote("msg_1")
            .with_run("run_1");
        assert_eq!(message.remote_id.as_deref(), Some("msg_1"));
        assert_eq!(message.run_id.as_deref(), Some("run_1"));
    }

    #[test]
    fn test_snapshot_readiness() {
        let mut snapshot = SessionSnapshot {
            file: None,
            assistant_id: None,
            thread_id: None,
            message_count: 0,
            model: "gpt-4-1106-preview".to_string(),
        };
        assert!(!snapshot.chat_ready());

        snapshot.file = Some(AttachedFile {
            file_id: "file-1".to_string(),
            filename: "data.csv".to_string(),
            size: 10,
        });
        snapshot.assistant_id = Some("asst_1".to_string());
        assert!(snapshot.chat_ready());
    }
}
