use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse, Response},
};

use crate::state::AppState;
use crate::ws::handler as ws_handler;

const CHAT_PAGE: &str = include_str!("../../assets/chat.html");

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The chat page with the display name filled in.
pub fn chat_page(app_name: &str) -> String {
    CHAT_PAGE.replace("{{app_name}}", &html_escape(app_name))
}

/// GET /: chat page, or the real-time endpoint when the request is a
/// WebSocket upgrade. With chat disabled, a plain greeting.
pub async fn root(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !state.enable_chat {
        return format!("Hello from {}!", state.app_name).into_response();
    }

    match upgrade {
        Ok(ws) => ws_handler::accept(ws, state),
        Err(_) => Html(chat_page(&state.app_name)).into_response(),
    }
}
