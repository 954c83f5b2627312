use serde::{Deserialize, Serialize};

pub const FRAME_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// User-facing reply whenever a chat exchange fails.
pub const APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your message. Please try again.";

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    pub content: String,
}

pub fn encode_content(content: &str) -> String {
    let frame = StreamFrame {
        content: content.to_string(),
    };
    let data = serde_json::to_string(&frame).unwrap_or_default();
    format!("{}{}\n\n", FRAME_PREFIX, data)
}

pub fn encode_done() -> String {
    format!("{}{}\n\n", FRAME_PREFIX, DONE_SENTINEL)
}

/// Returns the trimmed payload of a `data: ` line, or `None` for any other line.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(FRAME_PREFIX).map(str::trim)
}

/// Reassembles newline-delimited lines from arbitrarily split reads.
///
/// Bytes after the last `\n` are held back until a later read completes the
/// line, so a frame (or a multi-byte character) cut in half is never decoded
/// early.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..complete.len() - 1]
            .split(|b| *b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }

    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_content_escapes_json() {
        let frame = encode_content("say \"hi\"\n");
        assert_eq!(frame, "data: {\"content\":\"say \\\"hi\\\"\\n\"}\n\n");
        assert_eq!(encode_done(), "data: [DONE]\n\n");
    }

    #[test]
    fn line_buffer_holds_back_partial_tail() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"data: {\"con").is_empty());
        assert_eq!(buffer.pending(), b"data: {\"con");

        let lines = buffer.push(b"tent\":\"x\"}\n\ndata: [DO");
        assert_eq!(lines, vec!["data: {\"content\":\"x\"}".to_string(), String::new()]);
        assert_eq!(buffer.pending(), b"data: [DO");
    }

    #[test]
    fn line_buffer_joins_split_multibyte_characters() {
        let bytes = "data: é\n".as_bytes();
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(&bytes[..7]).is_empty());
        assert_eq!(buffer.push(&bytes[7..]), vec!["data: é".to_string()]);
    }

    #[test]
    fn line_buffer_strips_carriage_returns() {
        let mut buffer = LineBuffer::new();
        assert_eq!(
            buffer.push(b"data: a\r\ndata: b\r\n"),
            vec!["data: a".to_string(), "data: b".to_string()]
        );
    }

    #[test]
    fn data_payload_requires_exact_marker() {
        assert_eq!(data_payload("data:  [DONE] "), Some("[DONE]"));
        assert_eq!(data_payload("data:x"), None);
        assert_eq!(data_payload("event: ping"), None);
    }
}
