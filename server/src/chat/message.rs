use std::fmt;

use crate::ws::ConnectionId;

/// A chat line from one connection. Exists only for the duration of a
/// single fan-out; nothing is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender_id: ConnectionId,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender_id: ConnectionId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            text: text.into(),
        }
    }
}

/// Wire form: `[<sender id> says]: <text>`.
impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} says]: {}", self.sender_id, self.text)
    }
}
