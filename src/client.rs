use crate::protocol::{DONE_SENTINEL, LineBuffer, StreamFrame, data_payload};
use crate::transcript::ChatEvent;
use futures::StreamExt;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use serde_json::json;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

type ClientResult<T> = Result<T, ClientError>;

/// What a single `FrameDecoder::push` produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub fragments: Vec<String>,
    pub done: bool,
}

/// Turns raw response bytes into the content fragments of `data: ` frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    lines: LineBuffer,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Decoded {
        let mut decoded = Decoded::default();

        for line in self.lines.push(chunk) {
            let Some(data) = data_payload(&line) else {
                continue;
            };
            if data == DONE_SENTINEL {
                decoded.done = true;
                break;
            }
            if data.is_empty() {
                continue;
            }

            match serde_json::from_str::<StreamFrame>(data) {
                Ok(frame) if !frame.content.is_empty() => decoded.fragments.push(frame.content),
                Ok(_) => {}
                Err(err) => debug!(data, %err, "failed to parse streaming data"),
            }
        }

        decoded
    }
}

#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    http: HttpClient,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            http: HttpClient::new(),
        }
    }

    /// Runs one exchange to completion. `Finished` is always the last event.
    pub async fn exchange<F, Fut>(&self, message: String, mut emit: F)
    where
        F: FnMut(ChatEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        if let Err(err) = self.stream_chat(&message, &mut emit).await {
            debug!(%err, "chat exchange failed");
            emit(ChatEvent::Failed(err.to_string())).await;
        }
        emit(ChatEvent::Finished).await;
    }

    pub async fn stream_chat<F, Fut>(&self, message: &str, emit: &mut F) -> ClientResult<()>
    where
        F: FnMut(ChatEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({ "message": message }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        emit(ChatEvent::AssistantStarted).await;

        let mut stream = response.bytes_stream();
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = stream.next().await {
            let decoded = decoder.push(&chunk?);
            for fragment in decoded.fragments {
                emit(ChatEvent::Fragment(fragment)).await;
            }
            if decoded.done {
                return Ok(());
            }
        }

        if !decoder.lines.pending().is_empty() {
            debug!("chat stream ended inside a frame");
        }
        Ok(())
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}
