use nh_ws::AppState;

use axum::{Router, routing::get};

/// Build the application router. The gateway only serves the WebSocket endpoint.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(nh_ws::handler))
        .with_state(state)
}
