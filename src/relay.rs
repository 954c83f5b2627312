use crate::ai_sdk::MessageParam;
use crate::llm::{CompletionProvider, LlmError};
use crate::persona;
use crate::protocol::{APOLOGY, encode_content, encode_done};
use crate::search::SearchChain;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub const PROGRESS_NOTICE: &str = "🔍 Searching the web for latest information...\n\n";

const SEARCH_KEYWORDS: &[&str] = &[
    "latest",
    "recent",
    "current",
    "news",
    "today",
    "now",
    "update",
    "what happened",
    "what is happening",
    "search for",
    "find information",
    "tell me about recent",
    "latest developments",
    "current trends",
];

/// Whether a message asks for fresh information and should be augmented with a web search.
pub fn should_search(message: &str) -> bool {
    let message = message.to_lowercase();
    SEARCH_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

pub fn build_prompt(message: &str) -> Vec<MessageParam> {
    vec![
        MessageParam::system(persona::system_prompt()),
        MessageParam::user(message),
    ]
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub max_tokens: u32,
    /// Bound on stream setup and on the gap between two upstream deltas.
    pub upstream_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            upstream_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Error)]
enum RelayError {
    #[error(transparent)]
    Upstream(#[from] LlmError),
    #[error("client went away")]
    Disconnected,
}

/// Bridges one chat message to one upstream completion stream.
pub struct Relay {
    provider: Arc<dyn CompletionProvider>,
    search: SearchChain,
    config: RelayConfig,
}

impl Relay {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        search: SearchChain,
        config: RelayConfig,
    ) -> Self {
        Self {
            provider,
            search,
            config,
        }
    }

    /// Writes encoded frames to `frames` until the exchange ends.
    ///
    /// Unless the receiver is dropped, the last frame written is always the
    /// `[DONE]` sentinel, preceded by one apology frame on upstream failure.
    pub async fn run(&self, message: String, frames: mpsc::Sender<String>) {
        let mut prompt = message;

        if should_search(&prompt) {
            if frames.send(encode_content(PROGRESS_NOTICE)).await.is_err() {
                return;
            }
            let results = self.search.augment(&prompt).await;
            prompt = format!("{}\n\nWeb search results:\n{}", prompt, results);
        }

        match self.stream_completion(&prompt, &frames).await {
            Ok(()) => {}
            Err(RelayError::Disconnected) => {
                debug!("chat client disconnected, dropping upstream stream");
                return;
            }
            Err(RelayError::Upstream(err)) => {
                error!(%err, "chat error");
                if frames.send(encode_content(APOLOGY)).await.is_err() {
                    return;
                }
            }
        }

        let _ = frames.send(encode_done()).await;
    }

    async fn stream_completion(
        &self,
        prompt: &str,
        frames: &mpsc::Sender<String>,
    ) -> Result<(), RelayError> {
        let timeout = self.config.upstream_timeout;
        let mut deltas = tokio::time::timeout(
            timeout,
            self.provider
                .stream(build_prompt(prompt), self.config.max_tokens),
        )
        .await
        .map_err(|_| LlmError::Timeout)??;

        let mut sent = 0usize;
        while let Some(delta) = tokio::time::timeout(timeout, deltas.next())
            .await
            .map_err(|_| LlmError::Timeout)?
        {
            let delta = delta?;
            if delta.is_empty() {
                continue;
            }
            frames
                .send(encode_content(&delta))
                .await
                .map_err(|_| RelayError::Disconnected)?;
            sent += 1;
        }

        info!(frames = sent, "chat completion streamed");
        Ok(())
    }
}
