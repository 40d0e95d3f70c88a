//! Integration tests for the WebSocket endpoint
//!
//! These tests run the real server on an ephemeral port and connect with a
//! real WebSocket client, validating the replay-on-connect guarantee and
//! the broadcast fan-out.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use terminwatch::models::{AvailabilityMessage, AvailabilitySnapshot, SERVICE_TIMEZONE};
use terminwatch::server::{self, AppState, SubscriberRegistry};
use terminwatch::store::SnapshotStore;

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_server() -> (AppState, String) {
    let state = AppState {
        store: Arc::new(SnapshotStore::new()),
        registry: Arc::new(SubscriberRegistry::new()),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/", listener.local_addr().unwrap());
    tokio::spawn(server::serve(listener, state.clone()));

    (state, url)
}

async fn connect(url: &str) -> WsClient {
    let (socket, _response) = connect_async(url).await.expect("connection failed");
    socket
}

/// Read frames until the next availability message
async fn next_message(socket: &mut WsClient) -> AvailabilityMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed")
            .expect("connection errored");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

fn snapshot_with_slots(timestamps: &[i64]) -> AvailabilitySnapshot {
    let slots = timestamps
        .iter()
        .map(|ts| SERVICE_TIMEZONE.timestamp_opt(*ts, 0).unwrap())
        .collect();
    AvailabilitySnapshot::available(slots)
}

/// Install a snapshot and fan it out, the way a poll cycle does
async fn install_and_broadcast(state: &AppState, snapshot: AvailabilitySnapshot) {
    let outcome = state.store.replace(snapshot).await;
    state.registry.broadcast(outcome.installed).await;
}

#[tokio::test]
async fn test_new_connection_receives_current_snapshot() {
    let (state, url) = start_server().await;
    state
        .store
        .replace(snapshot_with_slots(&[1717228800]))
        .await;

    let mut client = connect(&url).await;
    let message = next_message(&mut client).await;

    assert_eq!(message.status, 200);
    assert_eq!(message.appointment_dates, vec!["2024-06-01T10:00:00Z"]);
    assert!(message.last_appointments_found_on.is_some());
}

#[tokio::test]
async fn test_replay_is_not_staler_than_registration() {
    let (state, url) = start_server().await;
    let current = state.store.read().await;

    let mut client = connect(&url).await;
    let message = next_message(&mut client).await;

    // First message must reflect a snapshot at least as fresh as the one
    // current when the client connected
    assert!(message.time >= current.to_message().time);
}

#[tokio::test]
async fn test_broadcast_reaches_all_clients_identically() {
    let (state, url) = start_server().await;

    let mut client1 = connect(&url).await;
    let mut client2 = connect(&url).await;
    next_message(&mut client1).await;
    next_message(&mut client2).await;

    install_and_broadcast(&state, snapshot_with_slots(&[1717228800])).await;

    let message1 = next_message(&mut client1).await;
    let message2 = next_message(&mut client2).await;

    assert_eq!(message1, message2);
    assert_eq!(message1.appointment_dates.len(), 1);
    assert!(message1.last_appointments_found_on.is_some());
}

#[tokio::test]
async fn test_empty_poll_keeps_last_found_marker() {
    let (state, url) = start_server().await;
    let mut client = connect(&url).await;
    next_message(&mut client).await;

    install_and_broadcast(&state, snapshot_with_slots(&[1717228800])).await;
    let found = next_message(&mut client).await;
    let marker = found.last_appointments_found_on.clone();
    assert!(marker.is_some());

    install_and_broadcast(&state, snapshot_with_slots(&[])).await;
    let empty = next_message(&mut client).await;

    assert!(empty.appointment_dates.is_empty());
    assert_eq!(empty.last_appointments_found_on, marker);
}

#[tokio::test]
async fn test_disconnected_client_is_unregistered() {
    let (state, url) = start_server().await;

    let mut client = connect(&url).await;
    next_message(&mut client).await;
    assert_eq!(state.registry.count().await, 1);

    client.close(None).await.unwrap();

    // The connection task notices the close asynchronously
    for _ in 0..50 {
        if state.registry.count().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.registry.count().await, 0);
}

#[tokio::test]
async fn test_client_messages_are_ignored() {
    let (state, url) = start_server().await;

    let mut client = connect(&url).await;
    next_message(&mut client).await;

    client
        .send(Message::text("please ignore me"))
        .await
        .unwrap();

    // The connection must survive and still receive broadcasts
    install_and_broadcast(&state, snapshot_with_slots(&[1717228800])).await;
    let message = next_message(&mut client).await;
    assert_eq!(message.appointment_dates.len(), 1);
}
