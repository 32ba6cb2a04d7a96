use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;

use crate::agents::AgentEvent;
use crate::api::errors::ApiError;
use crate::api::state::AppState;

/// Response from a one-shot publish
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
    /// Subscribers that were handed the event
    pub delivered: usize,
    /// Subscribers dropped because the send failed
    pub dropped: usize,
    /// Live subscribers after the broadcast
    pub connections: usize,
}

/// Publish a single event to every connected observer
///
/// POST /event
pub async fn publish_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PublishResponse>, ApiError> {
    let event = AgentEvent::from_slice(&body).map_err(|e| {
        tracing::warn!("Rejected injected event: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!("Injecting event: {} for {}", event.kind(), event.agent_id());
    let report = state.broadcaster.broadcast(&event).await;

    Ok(Json(PublishResponse {
        status: "ok",
        delivered: report.delivered,
        dropped: report.dropped,
        connections: state.registry.count(),
    }))
}
