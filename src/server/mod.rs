//! WebSocket endpoint streaming availability snapshots
//!
//! Clients connect to `/`, receive the current snapshot once, then one
//! snapshot per poll cycle until they disconnect. Inbound frames are read
//! only to notice the connection closing; their content is ignored.

pub mod registry;

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::store::SnapshotStore;

pub use registry::{SubscriberId, SubscriberRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Last known availability
    pub store: Arc<SnapshotStore>,

    /// Connected live clients
    pub registry: Arc<SubscriberRegistry>,
}

/// Build the router with the WebSocket endpoint
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve connections on an already-bound listener until the process exits
///
/// The listener is bound by the caller; a bind failure is a fatal startup
/// error, not a server error.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serve one subscriber until its connection closes
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = state.registry.register(tx.clone()).await;
    tracing::info!(subscriber = ?id, "client connected");

    // Replay the snapshot current at registration time. It goes through
    // the same queue as broadcasts, so the client can never observe a
    // snapshot older than the one current when it registered.
    let current = state.store.read().await;
    let _ = tx.send(current);
    drop(tx);

    loop {
        tokio::select! {
            queued = rx.recv() => {
                let Some(snapshot) = queued else {
                    // Registry dropped us after a failed broadcast send
                    break;
                };
                let payload = match serde_json::to_string(&snapshot.to_message()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!("failed to encode snapshot: {e}");
                        continue;
                    }
                };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    // Clients are not expected to send anything; drop
                    // whatever arrives and keep watching for the close.
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
        }
    }

    state.registry.unregister(id).await;
    tracing::info!(subscriber = ?id, "client disconnected");
}
