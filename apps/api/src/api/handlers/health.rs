use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        connections: state.registry.count(),
    })
}

/// Service description with the available endpoints
///
/// GET /
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "name": "CommandDeck Relay",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "websocket": "GET /ws",
            "inject_event": "POST /event",
            "health": "GET /health",
        },
    }))
}
