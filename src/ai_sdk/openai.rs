use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatCompletionRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<MessageParam>,
    pub(crate) stream: bool,
    pub(crate) max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParam {
    pub role: Role,
    pub content: String,
}

impl MessageParam {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionChunk {
    #[serde(default)]
    pub(crate) choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub(crate) delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Delta {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

impl ChatCompletionChunk {
    /// Text carried by the first choice's delta, if any.
    pub(crate) fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_openai_shape() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![MessageParam::system("be nice"), MessageParam::user("hi")],
            stream: true,
            max_tokens: 1000,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "be nice"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": true,
                "max_tokens": 1000
            })
        );
    }

    #[test]
    fn chunk_content_skips_null_and_missing_deltas() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "c1",
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hi"}}]
        }))
        .unwrap();
        assert_eq!(chunk.into_content().as_deref(), Some("Hi"));

        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{"index": 0, "delta": {"content": null}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(chunk.into_content(), None);

        let chunk: ChatCompletionChunk = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert_eq!(chunk.into_content(), None);
    }
}
