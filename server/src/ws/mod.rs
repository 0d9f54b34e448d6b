pub mod actor;
pub mod broadcast;
pub mod handler;
pub mod protocol;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Opaque identifier assigned to a connection when it is registered.
/// UUIDv7, so ids are never reused for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Liveness probing for each connection: a ping every `ping_interval`, and
/// the peer is dropped if no pong arrives within `pong_timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        }
    }
}

/// Connection registry: every live WebSocket connection keyed by its id.
///
/// Connect and disconnect take the write lock. A broadcast holds the read lock
/// for its whole fan-out, so each broadcast reaches exactly the connections
/// registered at that instant.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionSender>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under a freshly assigned id.
    #[cfg(test)]
    pub fn register(&self, sender: ConnectionSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.insert(id, sender);
        id
    }

    /// Add a connection under an id the caller already holds.
    pub fn insert(&self, id: ConnectionId, sender: ConnectionSender) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, ConnectionSender>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
