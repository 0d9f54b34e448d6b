use super::protocol::Event;
use super::{ConnectionRegistry, ConnectionSender};

/// Broadcast an event to every connected client, the sender included.
///
/// Delivery is best-effort: a connection whose writer has already gone away
/// is skipped without affecting the others. Returns how many connections the
/// event was handed to.
pub fn broadcast_to_all(registry: &ConnectionRegistry, event: &Event) -> usize {
    let Some(msg) = event.to_message() else {
        return 0;
    };

    let connections = registry.read();
    let mut delivered = 0;
    for (id, sender) in connections.iter() {
        if sender.send(msg.clone()).is_ok() {
            delivered += 1;
        } else {
            tracing::debug!(connection_id = %id, "Skipped delivery to closed connection");
        }
    }
    delivered
}

/// Encode and push an event onto a single connection's queue.
pub fn send_event(tx: &ConnectionSender, event: &Event) -> bool {
    match event.to_message() {
        Some(msg) => tx.send(msg).is_ok(),
        None => false,
    }
}
