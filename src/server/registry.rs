//! Registry of live WebSocket subscribers
//!
//! Tracks the outbound channel of every connected client. Registration and
//! removal happen on connection events, broadcasts on poll cycles; all of
//! it may interleave, so the locking lives inside the type and the three
//! operations are the only way in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::models::AvailabilitySnapshot;

/// Outbound channel for one subscriber
pub type SnapshotSender = mpsc::UnboundedSender<Arc<AvailabilitySnapshot>>;

/// Opaque handle identifying one registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Set of currently connected live clients
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, SnapshotSender>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Add a subscriber and return its handle
    ///
    /// The caller must replay the then-current snapshot to the new
    /// subscriber immediately afterwards; the registry only fans out
    /// future broadcasts.
    pub async fn register(&self, sender: SnapshotSender) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().await.insert(id, sender);
        id
    }

    /// Remove a subscriber; idempotent
    pub async fn unregister(&self, id: SubscriberId) {
        self.subscribers.lock().await.remove(&id);
    }

    /// Send a snapshot to every registered subscriber
    ///
    /// A failed send means the subscriber's connection task is gone; it is
    /// dropped from the registry without affecting delivery to the others.
    /// Returns the number of subscribers that received the snapshot.
    pub async fn broadcast(&self, snapshot: Arc<AvailabilitySnapshot>) -> usize {
        let mut subscribers = self.subscribers.lock().await;

        let mut dropped = Vec::new();
        for (id, sender) in subscribers.iter() {
            if sender.send(snapshot.clone()).is_err() {
                dropped.push(*id);
            }
        }

        for id in &dropped {
            subscribers.remove(id);
        }
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "dropped disconnected subscribers");
        }

        subscribers.len()
    }

    /// Number of currently registered subscribers
    pub async fn count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
