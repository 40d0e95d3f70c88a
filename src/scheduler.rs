//! Fixed-interval polling loop
//!
//! One scheduler instance runs per process, cycling through
//! fetch → merge → broadcast → sleep until the process exits. Fetch
//! failures become `upstreamUnavailable` snapshots and the loop keeps
//! going; the polling interval itself is the retry delay.

use std::sync::Arc;
use std::time::Duration;

use crate::fetcher::AvailabilityFetcher;
use crate::models::AvailabilitySnapshot;
use crate::notify::Notifier;
use crate::server::SubscriberRegistry;
use crate::store::SnapshotStore;

/// Minimum seconds between polls, mandated by the booking team.
/// Intervals may be raised above this, never lowered below it.
pub const MIN_POLL_INTERVAL_SECS: u64 = 180;

/// Driver of the poll-diff-broadcast cycle
pub struct PollScheduler {
    fetcher: AvailabilityFetcher,
    store: Arc<SnapshotStore>,
    registry: Arc<SubscriberRegistry>,
    notifier: Box<dyn Notifier>,
    interval: Duration,
}

impl PollScheduler {
    pub fn new(
        fetcher: AvailabilityFetcher,
        store: Arc<SnapshotStore>,
        registry: Arc<SubscriberRegistry>,
        notifier: Box<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            registry,
            notifier,
            interval: interval.max(Duration::from_secs(MIN_POLL_INTERVAL_SECS)),
        }
    }

    /// Run the polling loop forever
    ///
    /// There is no cancellation; process termination is the only way to
    /// stop the loop.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "poll scheduler started"
        );

        loop {
            self.poll_once().await;

            tracing::debug!("sleeping until next poll");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Execute one fetch → merge → broadcast cycle
    ///
    /// Never fails: a fetch error is merged and broadcast as an
    /// `upstreamUnavailable` snapshot just like a success. Returns the
    /// snapshot installed by this cycle.
    pub async fn poll_once(&self) -> Arc<AvailabilitySnapshot> {
        tracing::debug!("fetching availability");
        let snapshot = match self.fetcher.fetch().await {
            Ok(slots) => {
                tracing::info!(count = slots.len(), "fetched appointment slots");
                AvailabilitySnapshot::available(slots)
            }
            Err(e) => {
                tracing::warn!("upstream fetch failed: {e}");
                AvailabilitySnapshot::unavailable(format!(
                    "Could not fetch results from Berlin.de - {e}"
                ))
            }
        };

        tracing::debug!("merging snapshot");
        let outcome = self.store.replace(snapshot).await;

        if outcome.newly_found {
            let count = outcome.installed.slots.len();
            tracing::info!(count, "appointments became available");
            if let Err(e) = self.notifier.slots_available(count).await {
                tracing::warn!(notifier = self.notifier.name(), "notification failed: {e}");
            }
        }

        tracing::debug!("broadcasting snapshot");
        let delivered = self.registry.broadcast(outcome.installed.clone()).await;
        tracing::debug!(subscribers = delivered, "broadcast complete");

        outcome.installed
    }
}
