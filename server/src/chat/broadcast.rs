//! Broadcast channel operations.
//! Each WebSocket actor calls these on connect, on every `chat message`
//! event, and on disconnect.

use crate::chat::message::ChatMessage;
use crate::ws::broadcast::{broadcast_to_all, send_event};
use crate::ws::protocol::{Event, CHAT_MESSAGE, CONNECTED};
use crate::ws::{ConnectionId, ConnectionRegistry, ConnectionSender};

/// Register a new connection and return the id assigned to it.
/// The connection is told its own id before it can receive any broadcast.
pub fn on_connect(registry: &ConnectionRegistry, sender: ConnectionSender) -> ConnectionId {
    let id = ConnectionId::new();
    send_event(&sender, &Event::new(CONNECTED, id.to_string()));
    registry.insert(id, sender);
    tracing::info!(
        connection_id = %id,
        connections = registry.len(),
        "A user connected"
    );
    id
}

/// Tag `text` with the sender's id and deliver it to every registered
/// connection, the sender included. Returns the number of recipients.
pub fn on_message(registry: &ConnectionRegistry, sender: ConnectionId, text: String) -> usize {
    tracing::info!(connection_id = %sender, "message: {}", text);

    let message = ChatMessage::new(sender, text);
    let event = Event::new(CHAT_MESSAGE, message.to_string());
    broadcast_to_all(registry, &event)
}

/// Remove a connection; later broadcasts never reach it.
pub fn on_disconnect(registry: &ConnectionRegistry, id: ConnectionId) {
    registry.unregister(id);
    tracing::info!(
        connection_id = %id,
        connections = registry.len(),
        "User disconnected"
    );
}
