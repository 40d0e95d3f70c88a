//! Configuration for the terminwatch watcher
//!
//! All configuration arrives through the command line (with interactive
//! prompts for the two required values); there is no file- or
//! environment-based configuration surface.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::scheduler::MIN_POLL_INTERVAL_SECS;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service page being watched, e.g.
    /// `https://service.berlin.de/dienstleistung/120686/`
    pub service_page_url: String,

    /// Operator contact email, included in every upstream request
    pub email: String,

    /// Operator-chosen script identifier, also included upstream
    pub script_id: String,

    /// Port the WebSocket server listens on
    pub port: u16,

    /// Suppress the audible alert when appointments are found
    pub quiet: bool,

    /// Seconds between upstream polls; raised to the upstream-mandated
    /// floor if configured below it
    pub poll_interval_secs: u64,
}

impl Config {
    /// Effective polling interval, never below the upstream floor
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.service_page_url)
            .map_err(|e| anyhow::anyhow!("invalid service page URL: {e}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("service page URL must be http(s), got {}", url.scheme());
        }

        if self.email.trim().is_empty() {
            anyhow::bail!("contact email must not be empty");
        }
        if !self.email.contains('@') || self.email.chars().any(char::is_whitespace) {
            anyhow::bail!("contact email does not look like an email address");
        }

        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            tracing::warn!(
                configured = self.poll_interval_secs,
                floor = MIN_POLL_INTERVAL_SECS,
                "poll interval below the upstream-mandated floor; using the floor"
            );
        }

        Ok(())
    }
}
