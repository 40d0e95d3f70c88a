//! terminwatch - Berlin.de appointment slot watcher
//!
//! Polls a service.berlin.de booking calendar at a fixed interval and
//! streams the current availability to any number of WebSocket
//! subscribers.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration and validation
//! - [`fetcher`] - Outbound requests to the booking system
//! - [`parser`] - HTML parsing of the booking calendar
//! - [`models`] - Core data structures and wire format
//! - [`store`] - The single process-wide availability snapshot
//! - [`scheduler`] - The fixed-interval polling loop
//! - [`server`] - WebSocket endpoint and subscriber registry
//! - [`notify`] - Audible alert on newly found appointments
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use terminwatch::config::Config;
//! use terminwatch::fetcher::AvailabilityFetcher;
//! use terminwatch::notify::SilentNotifier;
//! use terminwatch::scheduler::PollScheduler;
//! use terminwatch::server::SubscriberRegistry;
//! use terminwatch::store::SnapshotStore;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config {
//!     service_page_url: "https://service.berlin.de/dienstleistung/120686/".to_string(),
//!     email: "me@example.com".to_string(),
//!     script_id: String::new(),
//!     port: 80,
//!     quiet: true,
//!     poll_interval_secs: 180,
//! };
//! config.validate()?;
//!
//! let fetcher = AvailabilityFetcher::new(&config)?;
//! let store = Arc::new(SnapshotStore::new());
//! let registry = Arc::new(SubscriberRegistry::new());
//!
//! PollScheduler::new(
//!     fetcher,
//!     store,
//!     registry,
//!     Box::new(SilentNotifier),
//!     config.poll_interval(),
//! )
//! .run()
//! .await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod fetcher;
pub mod models;
pub mod notify;
pub mod parser;
pub mod scheduler;
pub mod server;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::fetcher::{AvailabilityFetcher, FetchError};
    pub use crate::models::{
        AvailabilityMessage, AvailabilitySnapshot, SnapshotStatus, SERVICE_TIMEZONE,
    };
    pub use crate::notify::{BeepNotifier, Notifier, SilentNotifier};
    pub use crate::scheduler::PollScheduler;
    pub use crate::server::{AppState, SubscriberRegistry};
    pub use crate::store::SnapshotStore;
}

// Direct re-exports for convenience
pub use models::{AvailabilityMessage, AvailabilitySnapshot, SnapshotStatus};
