pub mod types;

pub use types::{ChatMessage, Sender};

/// Conversation history for one session.
///
/// Owned by the UI thread; cleared when the session ends.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(Sender::User, text));
    }

    pub fn add_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(Sender::Assistant, text));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
