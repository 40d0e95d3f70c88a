//! HTML parsing for the upstream appointment listing
//!
//! Extracts bookable appointment moments from a booking calendar page.
//! Stateless: raw document in, ordered timestamps out.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use scraper::{Html, Selector};

use crate::models::SERVICE_TIMEZONE;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Anchor inside a bookable calendar cell; the href's final path
    // segment is the slot's Unix timestamp.
    static ref BOOKABLE_SLOT: Selector = parse_selector!("td.buchbar a");
}

/// Extract every bookable slot from a calendar page, in document order
///
/// Malformed markers (missing href, non-numeric path segment) are skipped
/// silently. A page with no bookable cells yields an empty vector, which
/// means "no appointments", not a parse failure.
pub fn parse_slots(html: &str) -> Vec<DateTime<Tz>> {
    let document = Html::parse_document(html);

    let mut slots = Vec::new();
    for element in document.select(&BOOKABLE_SLOT) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(timestamp) = decode_slot_timestamp(href) else {
            tracing::debug!(href = %href, "skipping slot marker with undecodable href");
            continue;
        };
        if let Some(slot) = SERVICE_TIMEZONE.timestamp_opt(timestamp, 0).single() {
            slots.push(slot);
        }
    }

    slots
}

/// Decode the Unix epoch seconds encoded in a slot link's final path segment
fn decode_slot_timestamp(href: &str) -> Option<i64> {
    let trimmed = href.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next()?;
    segment.parse::<i64>().ok()
}
