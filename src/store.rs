//! Process-wide "last known availability" state
//!
//! The store is the sole owner of the current [`AvailabilitySnapshot`].
//! Readers get a consistent `Arc` view, never a mix of old and new fields;
//! the scheduler replaces the snapshot wholesale once per poll cycle.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{AvailabilitySnapshot, SERVICE_TIMEZONE};

/// Result of installing a new snapshot
pub struct ReplaceOutcome {
    /// The snapshot as installed, with carry-forward applied
    pub installed: Arc<AvailabilitySnapshot>,

    /// True iff the slot sequence went from empty to non-empty
    pub newly_found: bool,
}

/// Concurrency-safe holder of the single current snapshot
pub struct SnapshotStore {
    current: RwLock<Arc<AvailabilitySnapshot>>,
}

impl SnapshotStore {
    /// Create a store holding the initial empty snapshot
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(AvailabilitySnapshot::initial())),
        }
    }

    /// A consistent view of the current snapshot
    pub async fn read(&self) -> Arc<AvailabilitySnapshot> {
        self.current.read().await.clone()
    }

    /// Atomically install a new snapshot
    ///
    /// This is the single point where the `last_slots_found_at`
    /// carry-forward is applied: an empty-slot snapshot inherits the
    /// previous value unchanged; a non-empty one stamps the new
    /// observation time. The returned outcome reports whether this
    /// replacement transitioned the slot sequence from empty to
    /// non-empty, which drives the one-shot notification.
    pub async fn replace(&self, mut snapshot: AvailabilitySnapshot) -> ReplaceOutcome {
        let mut current = self.current.write().await;

        let newly_found = current.slots.is_empty() && !snapshot.slots.is_empty();
        snapshot.last_slots_found_at = if snapshot.slots.is_empty() {
            current.last_slots_found_at
        } else {
            Some(snapshot.observed_at.with_timezone(&SERVICE_TIMEZONE))
        };

        let installed = Arc::new(snapshot);
        *current = installed.clone();

        ReplaceOutcome {
            installed,
            newly_found,
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
