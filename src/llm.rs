use crate::ai_sdk::{ChatCompletionChunk, ChatCompletionRequest, MessageParam};
use crate::protocol::{DONE_SENTINEL, LineBuffer, data_payload};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured for the completion provider")]
    MissingApiKey,
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API error: {status} - {body}")]
    Status { status: StatusCode, body: String },
    #[error("completion stream timed out")]
    Timeout,
}

/// Incremental text deltas of one completion, in arrival order.
pub type CompletionStream = BoxStream<'static, Result<String, LlmError>>;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn stream(
        &self,
        messages: Vec<MessageParam>,
        max_tokens: u32,
    ) -> Result<CompletionStream, LlmError>;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Client for OpenAI-compatible `chat/completions` endpoints (OpenAI, Azure OpenAI v1).
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn stream(
        &self,
        messages: Vec<MessageParam>,
        max_tokens: u32,
    ) -> Result<CompletionStream, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            stream: true,
            max_tokens,
        };

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.endpoint.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let mut bytes = response.bytes_stream();
        let deltas = async_stream::try_stream! {
            let mut lines = LineBuffer::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(LlmError::from)?;
                for line in lines.push(&chunk) {
                    let Some(data) = data_payload(&line) else {
                        continue;
                    };
                    if data == DONE_SENTINEL {
                        break 'read;
                    }
                    if data.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ChatCompletionChunk>(data) {
                        Ok(parsed) => {
                            if let Some(content) = parsed.into_content() {
                                yield content;
                            }
                        }
                        Err(err) => debug!(%err, "skipping unparseable completion chunk"),
                    }
                }
            }
        };

        Ok(deltas.boxed())
    }
}
