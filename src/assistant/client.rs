use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::assistant::types::{
    ApiErrorEnvelope, AssistantObject, DeletionStatus, FileObject, ListResponse, MessageObject,
    ModelInfo, RunObject, ThreadObject,
};
use crate::error::{Error, Result};

/// Version tag the service requires on assistants-era endpoints.
const BETA_HEADER: &str = "assistants=v1";

/// Client for the hosted assistant service. One instance per API key.
pub struct AssistantClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AssistantClient {
    pub fn new(api_key: String, request_timeout_secs: u64) -> Result<Self> {
        let base_url = "https://api.openai.com".to_string();
        Self::with_base_url(api_key, base_url, request_timeout_secs)
    }

    pub fn with_base_url(
        api_key: String,
        base_url: String,
        request_timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| Error::api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn create_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| Error::api(format!("Invalid API key format: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        headers.insert(
            HeaderName::from_static("openai-beta"),
            HeaderValue::from_static(BETA_HEADER),
        );

        Ok(headers)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        error!("Assistant service error: {} - {}", status, detail);
        Err(Error::api(format!("API error {}: {}", status, detail)))
    }

    /// Cheapest call that requires a valid key; used as the credential probe.
    pub async fn validate_key(&self) -> Result<()> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .headers(self.create_headers()?)
            .send()
            .await?;
        self.check(response).await?;
        debug!("API key accepted by the service");
        Ok(())
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .headers(self.create_headers()?)
            .send()
            .await?;
        let list: ListResponse<ModelInfo> = self.check(response).await?.json().await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    /// Uploads file contents for assistant ingestion.
    pub async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<FileObject> {
        let url = format!("{}/v1/files", self.base_url);

        let mime = if filename.to_lowercase().ends_with(".csv") {
            "text/csv"
        } else {
            "text/plain"
        };
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        debug!("Uploading file to the service: {}", filename);
        let start_time = Instant::now();

        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .multipart(form)
            .send()
            .await?;
        let file: FileObject = self.check(response).await?.json().await?;

        debug!(
            "Uploaded {} as {} in {:?}",
            filename,
            file.id,
            start_time.elapsed()
        );
        Ok(file)
    }

    pub async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
        file_id: &str,
    ) -> Result<AssistantObject> {
        let url = format!("{}/v1/assistants", self.base_url);

        let request = CreateAssistantRequest {
            name,
            instructions,
            model,
            tools: vec![ToolSpec {
                kind: "code_interpreter",
            }],
            file_ids: vec![file_id],
        };

        debug!("Creating assistant for file {}", file_id);

        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .json(&request)
            .send()
            .await?;
        let assistant: AssistantObject = self.check(response).await?.json().await?;

        debug!("Created assistant {}", assistant.id);
        Ok(assistant)
    }

    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        let url = format!("{}/v1/assistants/{}", self.base_url, assistant_id);

        debug!("Deleting assistant {}", assistant_id);

        let response = self
            .client
            .delete(&url)
            .headers(self.create_headers()?)
            .send()
            .await?;
        let status: DeletionStatus = self.check(response).await?.json().await?;

        if !status.deleted {
            return Err(Error::api(format!(
                "Service did not confirm deletion of assistant {}",
                status.id
            )));
        }
        Ok(())
    }

    pub async fn create_thread(&self) -> Result<ThreadObject> {
        let url = format!("{}/v1/threads", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let thread: ThreadObject = self.check(response).await?.json().await?;

        debug!("Created thread {}", thread.id);
        Ok(thread)
    }

    pub async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageObject> {
        let url = format!("{}/v1/threads/{}/messages", self.base_url, thread_id);

        let request = CreateMessageRequest {
            role: "user",
            content,
        };

        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .json(&request)
            .send()
            .await?;
        let message: MessageObject = self.check(response).await?.json().await?;

        debug!("Added message {} to thread {}", message.id, thread_id);
        Ok(message)
    }

    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<RunObject> {
        let url = format!("{}/v1/threads/{}/runs", self.base_url, thread_id);

        let request = CreateRunRequest {
            assistant_id,
            instructions,
        };

        let response = self
            .client
            .post(&url)
            .headers(self.create_headers()?)
            .json(&request)
            .send()
            .await?;
        let run: RunObject = self.check(response).await?.json().await?;

        debug!("Created run {} on thread {}", run.id, thread_id);
        Ok(run)
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunObject> {
        let url = format!("{}/v1/threads/{}/runs/{}", self.base_url, thread_id, run_id);

        let response = self
            .client
            .get(&url)
            .headers(self.create_headers()?)
            .send()
            .await?;
        self.check(response).await?.json().await.map_err(Into::into)
    }

    /// Lists a thread's messages, newest first (service ordering).
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>> {
        let url = format!("{}/v1/threads/{}/messages", self.base_url, thread_id);

        let response = self
            .client
            .get(&url)
            .headers(self.create_headers()?)
            .send()
            .await?;
        let list: ListResponse<MessageObject> = self.check(response).await?.json().await?;
        Ok(list.data)
    }
}

#[derive(Debug, Serialize)]
struct CreateAssistantRequest<'a> {
    name: &'a str,
    instructions: &'a str,
    model: &'a str,
    tools: Vec<ToolSpec>,
    file_ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}
