use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{Mutex, Notify};

use crate::agents::AgentEvent;
use crate::api::state::AppState;
use crate::relay::{DeliveryError, DeliveryResult, Subscriber, SubscriberHandle};

/// Write half of an observer's WebSocket
pub struct WebSocketSubscriber {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    closed: Notify,
}

impl WebSocketSubscriber {
    fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
            closed: Notify::new(),
        }
    }

    /// Resolves once the broadcaster has dropped this subscriber
    async fn closed(&self) {
        self.closed.notified().await
    }
}

#[async_trait]
impl Subscriber for WebSocketSubscriber {
    async fn send(&self, payload: &str) -> DeliveryResult<()> {
        self.sink
            .lock()
            .await
            .send(Message::Text(payload.to_owned()))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    fn close(&self) {
        // Stores a permit, so the read loop sees it even if it is mid-broadcast.
        self.closed.notify_one();
    }
}

/// WebSocket endpoint for real-time event streaming
///
/// GET /ws
///
/// Every connected client is an observer. Text frames sent by a client are
/// validated and broadcast to all observers, the sender included; invalid
/// frames get an `{"error": ...}` notice sent back to that client only.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let subscriber = Arc::new(WebSocketSubscriber::new(sink));
    let handle = SubscriberHandle::from_arc(subscriber.clone());

    state.registry.register(handle.clone());
    tracing::info!(
        subscriber = %handle.id(),
        "Client connected. Total connections: {}",
        state.registry.count()
    );

    loop {
        let frame = tokio::select! {
            _ = subscriber.closed() => {
                tracing::debug!(subscriber = %handle.id(), "Dropped by broadcaster, closing socket");
                break;
            }
            frame = stream.next() => frame,
        };

        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    if reply_error(&state, &handle, "Binary frame is not valid UTF-8")
                        .await
                        .is_err()
                    {
                        break;
                    }
                    continue;
                }
            },
            Some(Ok(Message::Close(_))) | None => break,
            // Ping and pong are answered by the transport
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(subscriber = %handle.id(), "WebSocket error: {}", e);
                break;
            }
        };

        match AgentEvent::from_json(&text) {
            Ok(event) => {
                tracing::info!("Received event: {} from {}", event.kind(), event.agent_id());
                state.broadcaster.broadcast(&event).await;
            }
            Err(e) => {
                tracing::warn!(subscriber = %handle.id(), "Invalid event data: {}", e);
                if reply_error(&state, &handle, &e.to_string()).await.is_err() {
                    break;
                }
            }
        }
    }

    state.registry.unregister(&handle);
    tracing::info!(
        subscriber = %handle.id(),
        "Client disconnected. Total connections: {}",
        state.registry.count()
    );
}

/// Sends an error notice to one client, bounded like any other send
async fn reply_error(state: &AppState, handle: &SubscriberHandle, message: &str) -> DeliveryResult<()> {
    let notice = json!({ "error": message }).to_string();
    let result = state.broadcaster.deliver(handle, &notice).await;
    if let Err(e) = &result {
        tracing::warn!(subscriber = %handle.id(), "Failed to send error notice: {}", e);
    }
    result
}
