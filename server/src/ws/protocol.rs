//! JSON event frames exchanged over the real-time endpoint.
//!
//! Every text frame is `{"event": <name>, "data": <payload>}`. Clients emit
//! `chat message` with a string payload; the server re-emits `chat message`
//! to every connection and sends `connected` (carrying the connection id) to
//! each new socket.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat;
use crate::ws::{ConnectionId, ConnectionRegistry};

/// Event name for chat traffic in both directions.
pub const CHAT_MESSAGE: &str = "chat message";

/// Event name for the server's greeting to a new connection.
pub const CONNECTED: &str = "connected";

/// A named event with an arbitrary JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Event {
    pub fn new(event: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Encode as a WebSocket text frame.
    pub fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(text) => Some(Message::Text(text.into())),
            Err(e) => {
                tracing::warn!(event = %self.event, error = %e, "Failed to encode event");
                None
            }
        }
    }
}

/// Render an inbound payload as chat text. Strings pass through; any other
/// JSON value is rendered as its JSON text.
pub fn payload_text(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Handle an incoming text frame.
/// Decodes the event, dispatches on its name. Malformed frames and unknown
/// events are logged and dropped.
pub fn handle_text_frame(text: &str, sender: ConnectionId, registry: &ConnectionRegistry) {
    let event = match serde_json::from_str::<Event>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(
                connection_id = %sender,
                error = %e,
                "Dropped malformed frame: {}",
                text.chars().take(100).collect::<String>()
            );
            return;
        }
    };

    match event.event.as_str() {
        CHAT_MESSAGE => {
            chat::broadcast::on_message(registry, sender, payload_text(&event.data));
        }
        other => {
            tracing::debug!(
                connection_id = %sender,
                event = %other,
                "Unhandled event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_text_renders_scalars() {
        assert_eq!(payload_text(&json!("hi")), "hi");
        assert_eq!(payload_text(&json!(42)), "42");
        assert_eq!(payload_text(&json!(true)), "true");
        assert_eq!(payload_text(&Value::Null), "null");
    }

    #[test]
    fn test_event_without_data_decodes_as_null() {
        let event: Event = serde_json::from_str(r#"{"event":"chat message"}"#).unwrap();
        assert_eq!(event, Event::new(CHAT_MESSAGE, Value::Null));
    }
}
