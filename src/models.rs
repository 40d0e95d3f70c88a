// Core data structures for the terminwatch watcher

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The fixed time zone all appointment timestamps are interpreted and
/// rendered in, regardless of server or client locale.
pub const SERVICE_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Outcome of one poll against the upstream booking system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// Upstream answered and the listing was parsed
    Ok,

    /// Upstream could not be fetched this cycle
    UpstreamUnavailable,
}

impl SnapshotStatus {
    /// HTTP-style status code used on the wire
    pub fn code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::UpstreamUnavailable => 502,
        }
    }
}

/// The authoritative availability state at one point in time
///
/// Exactly one snapshot is current at any instant; it is replaced wholesale
/// once per poll cycle and never field-mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySnapshot {
    /// When the snapshot was produced
    pub observed_at: DateTime<Utc>,

    /// Outcome of the poll that produced it
    pub status: SnapshotStatus,

    /// Bookable appointment moments, in document order, service-local time.
    /// Duplicates from upstream pass through unchanged.
    pub slots: Vec<DateTime<Tz>>,

    /// Human-readable explanation, empty on success
    pub message: String,

    /// Most recent time a snapshot had non-empty slots, carried forward
    /// across empty polls; None until that first happens in a run
    pub last_slots_found_at: Option<DateTime<Tz>>,
}

impl AvailabilitySnapshot {
    /// The snapshot installed at process start, before the first poll
    pub fn initial() -> Self {
        Self {
            observed_at: Utc::now(),
            status: SnapshotStatus::Ok,
            slots: Vec::new(),
            message: String::new(),
            last_slots_found_at: None,
        }
    }

    /// Snapshot for a successful poll
    pub fn available(slots: Vec<DateTime<Tz>>) -> Self {
        Self {
            observed_at: Utc::now(),
            status: SnapshotStatus::Ok,
            slots,
            message: String::new(),
            last_slots_found_at: None,
        }
    }

    /// Snapshot for a failed poll
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            observed_at: Utc::now(),
            status: SnapshotStatus::UpstreamUnavailable,
            slots: Vec::new(),
            message: message.into(),
            last_slots_found_at: None,
        }
    }

    /// Render the snapshot as the JSON object sent to subscribers
    pub fn to_message(&self) -> AvailabilityMessage {
        AvailabilityMessage {
            time: format_timestamp(&self.observed_at),
            status: self.status.code(),
            appointment_dates: self.slots.iter().map(format_timestamp).collect(),
            message: self.message.clone(),
            last_appointments_found_on: self.last_slots_found_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Wire format pushed to every connected subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityMessage {
    pub time: String,
    pub status: u16,
    pub appointment_dates: Vec<String>,
    pub message: String,
    pub last_appointments_found_on: Option<String>,
}

/// Wall-clock rendering used for `time` and `appointmentDates`
fn format_timestamp<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin(ts: i64) -> DateTime<Tz> {
        SERVICE_TIMEZONE.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn test_initial_snapshot_is_empty_and_ok() {
        let snapshot = AvailabilitySnapshot::initial();
        assert_eq!(snapshot.status, SnapshotStatus::Ok);
        assert!(snapshot.slots.is_empty());
        assert!(snapshot.message.is_empty());
        assert!(snapshot.last_slots_found_at.is_none());
    }

    #[test]
    fn test_message_field_names() {
        let snapshot = AvailabilitySnapshot::initial();
        let json = serde_json::to_value(snapshot.to_message()).unwrap();

        assert!(json.get("time").is_some());
        assert!(json.get("status").is_some());
        assert!(json.get("appointmentDates").is_some());
        assert!(json.get("message").is_some());
        assert!(json.get("lastAppointmentsFoundOn").is_some());
    }

    #[test]
    fn test_message_status_codes() {
        assert_eq!(AvailabilitySnapshot::initial().to_message().status, 200);
        assert_eq!(
            AvailabilitySnapshot::unavailable("boom").to_message().status,
            502
        );
    }

    #[test]
    fn test_unavailable_snapshot_has_message_and_no_slots() {
        let snapshot = AvailabilitySnapshot::unavailable("upstream down");
        assert_eq!(snapshot.status, SnapshotStatus::UpstreamUnavailable);
        assert!(snapshot.slots.is_empty());
        assert_eq!(snapshot.message, "upstream down");
    }

    #[test]
    fn test_appointment_dates_rendered_in_service_local_time() {
        // 2024-06-01 08:00:00 UTC is 10:00 in Berlin (CEST)
        let slot = berlin(1717228800);
        let snapshot = AvailabilitySnapshot::available(vec![slot]);
        let message = snapshot.to_message();

        assert_eq!(message.appointment_dates, vec!["2024-06-01T10:00:00Z"]);
    }

    #[test]
    fn test_time_rendered_in_utc() {
        let mut snapshot = AvailabilitySnapshot::initial();
        snapshot.observed_at = Utc.timestamp_opt(1717228800, 0).unwrap();
        assert_eq!(snapshot.to_message().time, "2024-06-01T08:00:00Z");
    }

    #[test]
    fn test_last_found_serializes_as_null_when_unset() {
        let json = serde_json::to_value(AvailabilitySnapshot::initial().to_message()).unwrap();
        assert!(json["lastAppointmentsFoundOn"].is_null());
    }

    #[test]
    fn test_last_found_rendered_as_rfc3339() {
        let mut snapshot = AvailabilitySnapshot::available(vec![berlin(1717228800)]);
        snapshot.last_slots_found_at = Some(berlin(1717228800));
        let message = snapshot.to_message();

        let rendered = message.last_appointments_found_on.unwrap();
        assert_eq!(rendered, "2024-06-01T10:00:00+02:00");
    }
}
