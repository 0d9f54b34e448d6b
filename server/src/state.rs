use std::sync::Arc;

use crate::config::Config;
use crate::users::{user_schema, Schema, SchemaError};
use crate::ws::{ConnectionRegistry, Heartbeat};

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Display name shown on the landing page
    pub app_name: Arc<str>,
    /// Whether the chat page and real-time endpoint are served
    pub enable_chat: bool,
    /// Field rules for `POST /api/users`, built once at startup
    pub user_schema: Arc<Schema>,
    /// Live WebSocket connections
    pub connections: ConnectionRegistry,
    /// Ping cadence and pong deadline for every WebSocket connection
    pub heartbeat: Heartbeat,
}

impl AppState {
    /// Build state from resolved config. Fails only if the user schema is
    /// misconfigured.
    pub fn from_config(config: &Config) -> Result<Self, SchemaError> {
        Ok(Self {
            app_name: Arc::from(config.app_name.as_str()),
            enable_chat: config.enable_chat,
            user_schema: Arc::new(user_schema()?),
            connections: ConnectionRegistry::new(),
            heartbeat: Heartbeat::default(),
        })
    }
}
