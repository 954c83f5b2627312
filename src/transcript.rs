use crate::protocol::APOLOGY;
use chrono::{DateTime, Local};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }
}

/// Progress of one chat exchange, in the order the client observes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    AssistantStarted,
    Fragment(String),
    Failed(String),
    Finished,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("message is empty")]
    Empty,
    #[error("a reply is still streaming")]
    Busy,
}

/// The chat history of one client session.
///
/// At most one assistant message is open for appends, and only while
/// `loading` is set.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    loading: bool,
    open: Option<String>,
}

impl Transcript {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: &str) -> Self {
        let mut transcript = Self::default();
        transcript
            .messages
            .push(ChatMessage::new(Role::Assistant, greeting));
        transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn open_message_id(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn submit(&mut self, input: &str) -> Result<String, SubmitError> {
        if input.trim().is_empty() {
            return Err(SubmitError::Empty);
        }
        if self.loading {
            return Err(SubmitError::Busy);
        }

        self.messages.push(ChatMessage::new(Role::User, input));
        self.loading = true;
        Ok(input.to_string())
    }

    pub fn apply(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::AssistantStarted => {
                let message = ChatMessage::new(Role::Assistant, "");
                self.open = Some(message.id.clone());
                self.messages.push(message);
            }
            ChatEvent::Fragment(text) => {
                let Some(open) = self.open.as_deref() else {
                    return;
                };
                if let Some(message) = self.messages.iter_mut().rev().find(|m| m.id == open) {
                    message.content.push_str(&text);
                }
            }
            ChatEvent::Failed(_) => {
                self.open = None;
                self.messages
                    .push(ChatMessage::new(Role::Assistant, APOLOGY));
            }
            ChatEvent::Finished => {
                self.open = None;
                self.loading = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_input_is_rejected_without_appending() {
        let mut transcript = Transcript::with_greeting("hello");
        assert_eq!(transcript.submit("   \n\t"), Err(SubmitError::Empty));
        assert_eq!(transcript.submit(""), Err(SubmitError::Empty));
        assert_eq!(transcript.messages().len(), 1);
        assert!(!transcript.is_loading());
    }

    #[test]
    fn second_send_is_refused_while_loading() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.submit("first").as_deref(), Ok("first"));
        assert_eq!(transcript.submit("second"), Err(SubmitError::Busy));
        assert_eq!(transcript.messages().len(), 1);

        transcript.apply(ChatEvent::Finished);
        assert!(transcript.submit("second").is_ok());
    }

    #[test]
    fn fragments_append_in_order_to_the_open_message() {
        let mut transcript = Transcript::new();
        transcript.submit("hi").unwrap();
        transcript.apply(ChatEvent::AssistantStarted);
        for fragment in ["Hel", "lo", "Hel", "lo"] {
            transcript.apply(ChatEvent::Fragment(fragment.to_string()));
        }
        transcript.apply(ChatEvent::Finished);

        let messages = transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "HelloHello");
        assert!(transcript.open_message_id().is_none());
        assert!(!transcript.is_loading());
    }

    #[test]
    fn failure_appends_error_reply_and_closes_stream() {
        let mut transcript = Transcript::new();
        transcript.submit("hi").unwrap();
        transcript.apply(ChatEvent::AssistantStarted);
        transcript.apply(ChatEvent::Fragment("partial".to_string()));
        transcript.apply(ChatEvent::Failed("connection reset".to_string()));
        transcript.apply(ChatEvent::Fragment("late".to_string()));
        transcript.apply(ChatEvent::Finished);

        let messages = transcript.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "partial");
        assert_eq!(messages[2].content, APOLOGY);
        assert!(!transcript.is_loading());
    }

    #[test]
    fn message_ids_are_unique() {
        let mut transcript = Transcript::new();
        for _ in 0..50 {
            transcript.submit("ping").unwrap();
            transcript.apply(ChatEvent::AssistantStarted);
            transcript.apply(ChatEvent::Finished);
        }
        let mut ids: Vec<_> = transcript.messages().iter().map(|m| m.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }
}
