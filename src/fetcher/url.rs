//! URL derivation for the booking system's month-paginated listing

use chrono::{DateTime, Datelike, TimeZone};
use chrono_tz::Tz;

use super::FetchError;
use crate::models::SERVICE_TIMEZONE;

/// Extract the numeric service id from a service page URL
///
/// `https://service.berlin.de/dienstleistung/120686/` → `120686`
pub fn service_id_from_page_url(page_url: &str) -> Result<String, FetchError> {
    let trimmed = page_url.trim_end_matches('/');
    let id = trimmed
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| FetchError::InvalidUrl(page_url.to_string()))?;

    Ok(id.to_string())
}

/// First instant of the following calendar month in the service time zone
///
/// Upstream paginates its calendar by month boundary; the second listing
/// page is keyed by this timestamp. December wraps into January of the
/// following year.
pub fn next_month_start(now: DateTime<Tz>) -> DateTime<Tz> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    // Midnight on the first of a month never falls inside a DST gap in
    // Europe/Berlin, so the conversion is total.
    SERVICE_TIMEZONE
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .earliest()
        .expect("first-of-month midnight exists in the service time zone")
}
