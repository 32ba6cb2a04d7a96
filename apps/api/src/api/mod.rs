// API layer module (ingress adapters)
// HTTP and WebSocket endpoints in front of the relay core

pub mod errors;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};

use handlers::{events, health, websocket};
pub use state::AppState;

/// Builds the relay's routes over `state`
///
/// Middleware (CORS, tracing) is layered on by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_check))
        .route("/event", post(events::publish_event))
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state)
}
