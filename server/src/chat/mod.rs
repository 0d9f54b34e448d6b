//! The broadcast chat channel: message formatting and the connect / message /
//! disconnect operations driven by each WebSocket actor.

pub mod broadcast;
pub mod message;
