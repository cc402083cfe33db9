use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::app::config::{AppConfig, AssistantConfig, PollingConfig};
use crate::assistant::{AssistantClient, RunPoller, RunStatus};
use crate::chat::types::{AttachedFile, SessionSnapshot, TranscriptMessage};
use crate::error::{Error, Result};

/// Orchestrates one conversation against the hosted service.
///
/// Holds the remote identifiers the service hands out (file, assistant,
/// thread) and the local transcript. At most one file and one assistant are
/// active at a time: attaching a file deletes the previous assistant before
/// provisioning the replacement.
pub struct ChatSession {
    client: Arc<AssistantClient>,
    assistant_cfg: AssistantConfig,
    polling_cfg: PollingConfig,
    model: String,
    state: RwLock<SessionState>,
}

#[derive(Default)]
struct SessionState {
    file: Option<AttachedFile>,
    assistant_id: Option<String>,
    thread_id: Option<String>,
    ingested: HashSet<FileFingerprint>,
    transcript: Vec<TranscriptMessage>,
}

/// Identity of a local file for the duplicate-upload guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileFingerprint {
    path: String,
    size: u64,
}

impl ChatSession {
    pub fn new(client: Arc<AssistantClient>, config: &AppConfig) -> Self {
        Self {
            client,
            assistant_cfg: config.assistant.clone(),
            polling_cfg: config.polling.clone(),
            model: config.service.model.clone(),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            file: state.file.clone(),
            assistant_id: state.assistant_id.clone(),
            thread_id: state.thread_id.clone(),
            message_count: state.transcript.len(),
            model: self.model.clone(),
        }
    }

    pub async fn transcript(&self) -> Vec<TranscriptMessage> {
        self.state.read().await.transcript.clone()
    }

    pub async fn has_file(&self) -> bool {
        self.state.read().await.file.is_some()
    }

    /// Ingests a local file: uploads it and provisions a fresh assistant
    /// around it. Replaces any previously active file/assistant pair; the
    /// thread is reset so answers never mix files.
    pub async fn attach_file(&self, path: &Path) -> Result<AttachedFile> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::validation("file path has no usable file name"))?
            .to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt") => {}
            _ => {
                return Err(Error::validation(
                    "only .csv and .txt files can be ingested",
                ))
            }
        }

        let bytes = tokio::fs::read(path).await?;
        let canonical = tokio::fs::canonicalize(path).await?;
        let fingerprint = FileFingerprint {
            path: canonical.to_string_lossy().into_owned(),
            size: bytes.len() as u64,
        };

        let mut state = self.state.write().await;

        if state.ingested.contains(&fingerprint) {
            return Err(Error::session(format!(
                "{} was already uploaded in this session",
                filename
            )));
        }

        // Delete-and-recreate keyed on the single active file. A failed
        // delete aborts the attach with the old assistant still in place.
        if let Some(assistant_id) = state.assistant_id.clone() {
            self.client.delete_assistant(&assistant_id).await?;
            state.assistant_id = None;
            state.thread_id = None;
            state.file = None;
            info!("Deleted assistant {} before re-provisioning", assistant_id);
        }

        let file = self.client.upload_file(&filename, bytes).await?;
        let assistant = self
            .client
            .create_assistant(
                &self.assistant_cfg.name,
                &self.assistant_cfg.instructions,
                &self.model,
                &file.id,
            )
            .await?;

        let attached = AttachedFile {
            file_id: file.id,
            filename,
            size: file.bytes,
        };

        state.assistant_id = Some(assistant.id.clone());
        state.thread_id = None;
        state.file = Some(attached.clone());
        state.ingested.insert(fingerprint);

        info!(
            "Provisioned assistant {} around file {}",
            assistant.id, attached.file_id
        );
        Ok(attached)
    }

    /// Sends one user turn and waits for the assistant's reply: appends the
    /// user message, creates the thread on first use, starts a run, polls it
    /// to completion, and appends that run's assistant messages in
    /// chronological order. Returns the newly appended assistant messages.
    pub async fn ask<F>(&self, text: &str, on_status: F) -> Result<Vec<TranscriptMessage>>
    where
        F: FnMut(RunStatus),
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("message must not be empty"));
        }

        let mut state = self.state.write().await;

        let assistant_id = state
            .assistant_id
            .clone()
            .ok_or_else(|| Error::session("attach a file before asking questions"))?;

        let thread_id = match state.thread_id.clone() {
            Some(thread_id) => thread_id,
            None => {
                let thread = self.client.create_thread().await?;
                state.thread_id = Some(thread.id.clone());
                thread.id
            }
        };

        let remote_message = self.client.add_message(&thread_id, text).await?;
        state
            .transcript
            .push(TranscriptMessage::user(text).with_remote(remote_message.id));

        let run = self
            .client
            .create_run(
                &thread_id,
                &assistant_id,
                Some(&self.assistant_cfg.run_instructions),
            )
            .await?;

        let poller = RunPoller::new(self.polling_cfg.clone());
        let run = poller
            .await_run(&self.client, &thread_id, &run.id, on_status)
            .await?;

        let messages = self.client.list_messages(&thread_id).await?;

        // The service lists newest first; reverse the run's replies so the
        // transcript stays chronological.
        let mut replies: Vec<TranscriptMessage> = messages
            .iter()
            .filter(|m| m.run_id.as_deref() == Some(run.id.as_str()) && m.is_assistant())
            .map(|m| {
                TranscriptMessage::assistant(m.text())
                    .with_remote(m.id.clone())
                    .with_run(run.id.clone())
            })
            .collect();
        replies.reverse();

        if replies.is_empty() {
            warn!("Run {} completed without assistant messages", run.id);
        }

        state.transcript.extend(replies.iter().cloned());
        Ok(replies)
    }
}
