//! WebSocket integration tests
//!
//! These tests run the relay on a real listener and connect to it with
//! WebSocket clients to verify:
//! - Connect/disconnect registration
//! - Fanout of published events, including back to the publisher
//! - Error notices for invalid frames, sent only to the offending client
//! - Events injected over HTTP reaching WebSocket observers
//! - Binary frames relayed when they carry UTF-8 text
//! - Sockets closed once the broadcaster drops a stalled client

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use commanddeck_api::agents::{AgentEvent, AgentType, EventKind};
use commanddeck_api::api::{self, AppState};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tower::util::ServiceExt; // for oneshot

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start the relay on an ephemeral port
async fn spawn_relay() -> (AppState, SocketAddr) {
    spawn_relay_with(AppState::new(Duration::from_secs(2))).await
}

async fn spawn_relay_with(state: AppState) -> (AppState, SocketAddr) {
    let app = api::router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    (state, addr)
}

/// Wait until the registry holds `expected` subscribers
async fn wait_for_connections(state: &AppState, expected: usize) {
    for _ in 0..200 {
        if state.registry.count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} connections, registry has {}",
        expected,
        state.registry.count()
    );
}

async fn connect(state: &AppState, addr: SocketAddr) -> Client {
    let before = state.registry.count();
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("ws connect");
    wait_for_connections(state, before + 1).await;
    ws
}

/// Next text frame as JSON, failing the test after a timeout
async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("message is JSON");
        }
    }
}

/// Asserts no text frame arrives within a short window
async fn expect_silence(ws: &mut Client) {
    if let Ok(Some(Ok(Message::Text(text)))) =
        tokio::time::timeout(Duration::from_millis(200), ws.next()).await
    {
        panic!("unexpected message: {}", text);
    }
}

#[tokio::test]
async fn test_connect_and_disconnect_update_registry() {
    let (state, addr) = spawn_relay().await;

    let mut first = connect(&state, addr).await;
    let _second = connect(&state, addr).await;
    assert_eq!(state.registry.count(), 2);

    first.close(None).await.expect("close");
    wait_for_connections(&state, 1).await;
}

#[tokio::test]
async fn test_published_event_reaches_every_client_including_sender() {
    let (state, addr) = spawn_relay().await;
    let mut publisher = connect(&state, addr).await;
    let mut observer = connect(&state, addr).await;

    let spawn_event = json!({
        "type": "spawn",
        "agent_id": "test-agent-1234",
        "agent_type": "scout",
        "target_pos": [0.0, 0.0, 0.0],
        "message": "Test agent deployed",
        "timestamp": 1700000000.5,
    });
    publisher
        .send(Message::Text(spawn_event.to_string()))
        .await
        .expect("send spawn");

    let expected = json!({
        "type": "spawn",
        "agent_id": "test-agent-1234",
        "agent_type": "scout",
        "target": null,
        "target_pos": [0.0, 0.0, 0.0],
        "progress": null,
        "message": "Test agent deployed",
        "timestamp": 1700000000.5,
    });
    assert_eq!(next_json(&mut observer).await, expected);
    assert_eq!(next_json(&mut publisher).await, expected);
}

#[tokio::test]
async fn test_events_from_one_client_arrive_in_order() {
    let (state, addr) = spawn_relay().await;
    let mut publisher = connect(&state, addr).await;
    let mut observer = connect(&state, addr).await;

    for step in 0..5 {
        let event = json!({
            "type": "move",
            "agent_id": "a1",
            "agent_type": "scout",
            "target_pos": [step as f64, 0.0, 0.0],
        });
        publisher
            .send(Message::Text(event.to_string()))
            .await
            .expect("send move");
    }

    for step in 0..5 {
        let event = next_json(&mut observer).await;
        assert_eq!(event["target_pos"][0], json!(step as f64));
    }
}

#[tokio::test]
async fn test_invalid_frame_gets_error_notice_only_to_sender() {
    let (state, addr) = spawn_relay().await;
    let mut sender = connect(&state, addr).await;
    let mut observer = connect(&state, addr).await;

    sender
        .send(Message::Text(
            json!({ "type": "teleport", "agent_id": "a1", "agent_type": "scout" }).to_string(),
        ))
        .await
        .expect("send invalid event");

    let notice = next_json(&mut sender).await;
    let message = notice["error"].as_str().expect("error notice");
    assert!(message.contains("type"));
    assert!(message.contains("teleport"));

    expect_silence(&mut observer).await;

    // The sender stays connected and can keep publishing
    assert_eq!(state.registry.count(), 2);
    sender
        .send(Message::Text(
            json!({ "type": "idle", "agent_id": "a1", "agent_type": "scout" }).to_string(),
        ))
        .await
        .expect("send valid event");
    assert_eq!(next_json(&mut observer).await["type"], "idle");
}

#[tokio::test]
async fn test_malformed_text_gets_error_notice() {
    let (state, addr) = spawn_relay().await;
    let mut client = connect(&state, addr).await;

    client
        .send(Message::Text("not json".to_string()))
        .await
        .expect("send garbage");

    let notice = next_json(&mut client).await;
    assert!(notice["error"]
        .as_str()
        .expect("error notice")
        .starts_with("Malformed JSON"));
}

#[tokio::test]
async fn test_http_injected_event_reaches_websocket_observers() {
    let (state, addr) = spawn_relay().await;
    let mut observer = connect(&state, addr).await;

    let response = api::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/event")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "type": "progress",
                        "agent_id": "agent-002",
                        "agent_type": "coder",
                        "progress": 50,
                        "message": "Refactoring in progress",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["delivered"], 1);
    assert_eq!(report["connections"], 1);

    let event = next_json(&mut observer).await;
    assert_eq!(event["type"], "progress");
    assert_eq!(event["progress"], 50);
}

#[tokio::test]
async fn test_utf8_binary_frame_is_relayed_as_event() {
    let (state, addr) = spawn_relay().await;
    let mut sender = connect(&state, addr).await;
    let mut observer = connect(&state, addr).await;

    let event = json!({ "type": "complete", "agent_id": "a7", "agent_type": "coder" });
    sender
        .send(Message::Binary(event.to_string().into_bytes()))
        .await
        .expect("send binary event");

    let relayed = next_json(&mut observer).await;
    assert_eq!(relayed["type"], "complete");
    assert_eq!(relayed["agent_id"], "a7");
    assert_eq!(relayed["agent_type"], "coder");
}

#[tokio::test]
async fn test_non_utf8_binary_frame_gets_error_notice_only_to_sender() {
    let (state, addr) = spawn_relay().await;
    let mut sender = connect(&state, addr).await;
    let mut observer = connect(&state, addr).await;

    sender
        .send(Message::Binary(vec![0xff, 0xfe, 0x00, 0x80]))
        .await
        .expect("send invalid bytes");

    let notice = next_json(&mut sender).await;
    assert_eq!(notice["error"], "Binary frame is not valid UTF-8");

    expect_silence(&mut observer).await;
    assert_eq!(state.registry.count(), 2);
}

#[tokio::test]
async fn test_stalled_client_is_dropped_and_its_socket_closed() {
    let (state, addr) = spawn_relay_with(AppState::new(Duration::from_millis(1))).await;
    // Never read from, so its receive buffers fill up
    let mut stalled = connect(&state, addr).await;

    let event = AgentEvent::new(EventKind::Progress, "bulk", AgentType::Worker)
        .unwrap()
        .with_message("x".repeat(1 << 20));

    let mut dropped = false;
    for _ in 0..500 {
        if state.broadcaster.broadcast(&event).await.dropped == 1 {
            dropped = true;
            break;
        }
    }
    assert!(dropped, "stalled client was never dropped");
    assert_eq!(state.registry.count(), 0);

    // Drain what was buffered; the server side must then end the stream
    let ended = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match stalled.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "socket stayed open after being dropped");
}
