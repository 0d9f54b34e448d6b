use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// Explicit WebSocket upgrade endpoint. `GET /` accepts the same upgrade.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    accept(ws, state)
}

/// Complete an upgrade and hand the socket to its connection actor.
pub fn accept(ws: WebSocketUpgrade, state: AppState) -> Response {
    ws.on_upgrade(move |socket| actor::run_connection(socket, state))
}
