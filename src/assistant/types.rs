use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states a run moves through on the service side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
}

impl RunStatus {
    /// A terminal status will never change on a later fetch.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::RequiresAction
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Expired => "expired",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub bytes: u64,
    pub created_at: i64,
    pub filename: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantObject {
    pub id: String,
    pub created_at: i64,
    pub name: Option<String>,
    pub model: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadObject {
    pub id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub created_at: i64,
    pub thread_id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessagePart>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
}

impl MessageObject {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    /// Concatenated text of all textual content parts.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.content {
            if let MessagePart::Text { text } = part {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&text.value);
            }
        }
        out
    }
}

/// A single element of a message's content array. Non-text parts are kept
/// opaque; this application only renders text.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: MessageText },
    ImageFile { image_file: serde_json::Value },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Envelope the service wraps collection responses in.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
}

/// Error body the service returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_parsing() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);
        assert!(!status.is_terminal());

        let status: RunStatus = serde_json::from_str("\"requires_action\"").unwrap();
        assert!(status.is_terminal());
        assert_eq!(status.to_string(), "requires_action");
    }

    #[test]
    fn test_run_with_last_error() {
        let json = r#"{
            "id": "run_abc",
            "object": "thread.run",
            "thread_id": "thread_abc",
            "assistant_id": "asst_abc",
            "status": "failed",
            "last_error": {"code": "rate_limit_exceeded", "message": "Rate limit reached"}
        }"#;

        let run: RunObject = serde_json::from_str(json).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        let err = run.last_error.unwrap();
        assert_eq!(err.code.as_deref(), Some("rate_limit_exceeded"));
        assert!(err.message.contains("Rate limit"));
    }

    #[test]
    fn test_message_text_concatenation() {
        let json = r#"{
            "id": "msg_abc",
            "object": "thread.message",
            "created_at": 1700000000,
            "thread_id": "thread_abc",
            "role": "assistant",
            "run_id": "run_abc",
            "content": [
                {"type": "text", "text": {"value": "First part.", "annotations": []}},
                {"type": "image_file", "image_file": {"file_id": "file-1"}},
                {"type": "text", "text": {"value": "Second part.", "annotations": []}}
            ]
        }"#;

        let message: MessageObject = serde_json::from_str(json).unwrap();
        assert!(message.is_assistant());
        assert_eq!(message.text(), "First part.\nSecond part.");
        assert_eq!(message.run_id.as_deref(), Some("run_abc"));
    }

    #[test]
    fn test_list_envelope() {
        let json = r#"{"object": "list", "data": [{"id": "gpt-4"}, {"id": "gpt-3.5-turbo"}], "has_more": false}"#;
        let list: ListResponse<ModelInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[0].id, "gpt-4");
        assert!(!list.has_more);
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "param": null, "code": "invalid_api_key"}}"#;
        let envelope: ApiErrorEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.error.message.contains("Incorrect API key"));
        assert_eq!(envelope.error.code.as_deref(), Some("invalid_api_key"));
    }
}
