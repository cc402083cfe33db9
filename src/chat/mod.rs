pub mod session;
pub mod types;

pub use session::ChatSession;
pub use types::{AttachedFile, MessageRole, SessionSnapshot, TranscriptMessage};
