//! Outbound fetching of the upstream appointment listing
//!
//! The fetcher owns the HTTP client, the operator's request identity and
//! the month-pagination policy: every poll fetches the current listing page
//! plus the page for the first day of the following month, and fails as a
//! whole if either page fails.

pub mod headers;
pub mod url;

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::header::HeaderMap;
use reqwest::Client;
use thiserror::Error;

use crate::config::Config;
use crate::models::SERVICE_TIMEZONE;
use crate::parser;

/// Production endpoint of the booking system
pub const DEFAULT_BASE_URL: &str = "https://service.berlin.de";

/// Per-request timeout; bounds worst-case poll cycle latency
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching availability upstream
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response status
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// The configured service page URL is unusable
    #[error("Invalid service page URL: {0}")]
    InvalidUrl(String),

    /// The contact identity cannot be encoded into request headers
    #[error("Invalid identity for request headers: {0}")]
    InvalidIdentity(String),
}

/// Fetcher for the booking system's availability listing
///
/// Both listing pages are requested with the same fixed header set,
/// including the identity headers the booking team requires of automated
/// clients.
pub struct AvailabilityFetcher {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    service_id: String,
}

impl AvailabilityFetcher {
    /// Create a fetcher for the service page named in the configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if no service id can be derived
    /// from the configured page URL, `FetchError::InvalidIdentity` if the
    /// contact identity cannot be encoded into headers, and
    /// `FetchError::Http` if the HTTP client cannot be created.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let service_id = url::service_id_from_page_url(&config.service_page_url)?;
        let headers = headers::build_identity_headers(&config.email, &config.script_id)?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            headers,
            base_url: DEFAULT_BASE_URL.to_string(),
            service_id,
        })
    }

    /// Point the fetcher at a different host, for tests with mock servers
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Listing page for the current month
    pub fn appointments_url(&self) -> String {
        format!(
            "{}/terminvereinbarung/termin/all/{}/",
            self.base_url, self.service_id
        )
    }

    /// Listing page keyed by a day inside the wanted month
    fn day_url(&self, timestamp: i64) -> String {
        format!(
            "{}/terminvereinbarung/termin/day/{}/",
            self.base_url, timestamp
        )
    }

    /// Fetch and parse the current and the following month's listings
    ///
    /// Both pages succeed or the whole fetch fails; a half-failed fetch
    /// never yields partial slot data. On success the result is page-1
    /// slots followed by page-2 slots, document order preserved, without
    /// de-duplication or sorting.
    pub async fn fetch(&self) -> Result<Vec<DateTime<Tz>>, FetchError> {
        let page1 = self.fetch_page(&self.appointments_url()).await?;
        let mut slots = parser::parse_slots(&page1);

        let next_month = url::next_month_start(Utc::now().with_timezone(&SERVICE_TIMEZONE));
        let page2 = self.fetch_page(&self.day_url(next_month.timestamp())).await?;
        slots.extend(parser::parse_slots(&page2));

        tracing::debug!(count = slots.len(), "parsed bookable slots");
        Ok(slots)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
