use axum::{middleware, routing::get, routing::post, Router};

use crate::middleware::{cors, security_headers};
use crate::public::{data, landing};
use crate::state::AppState;
use crate::users::create;
use crate::ws::handler as ws_handler;

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(landing::root))
        .route("/api/data", get(data::open_data));

    let user_routes = Router::new().route("/api/users", post(create::create_user));

    // Health check
    let health = Router::new().route("/health", get(health_check));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(health);

    // WebSocket endpoint alias; `/` also upgrades
    if state.enable_chat {
        router = router.route("/ws", get(ws_handler::ws_upgrade));
    }

    router
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
