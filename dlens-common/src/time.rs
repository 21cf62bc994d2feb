//! Timestamp utilities
//!
//! Analysis records and snapshots all carry the same human-readable
//! `YYYY-MM-DD HH:MM:SS` upload timestamp, taken once per batch.

use chrono::{DateTime, Utc};

/// Format used for `upload_time` in database rows and snapshots
pub const UPLOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp in the shared `upload_time` format
pub fn format_upload_time(ts: DateTime<Utc>) -> String {
    ts.format(UPLOAD_TIME_FORMAT).to_string()
}

/// Current time, pre-rendered in the `upload_time` format
pub fn upload_time_now() -> String {
    format_upload_time(now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_matches_expected_layout() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(format_upload_time(ts), "2026-03-14 09:26:53");
    }

    #[test]
    fn upload_time_now_has_fixed_width() {
        // "YYYY-MM-DD HH:MM:SS" is always 19 characters
        assert_eq!(upload_time_now().len(), 19);
    }

    #[test]
    fn now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // after 2000-01-01
    }
}
