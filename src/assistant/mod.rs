pub mod client;
pub mod poll;
pub mod types;

pub use client::AssistantClient;
pub use poll::RunPoller;
pub use types::{
    AssistantObject, FileObject, MessageObject, RunObject, RunStatus, ThreadObject,
};
