//! Record transformation and controller-time helpers.
//!
//! The controller reports epoch milliseconds and the collector reasons about
//! wall-clock time in its UTC+8 zone. Points keep that zone for display but
//! always denote the same absolute instant.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::models::{ConnectionRecord, PointTags, SessionTraffic, TrafficPoint};

// ---

const CONTROLLER_UTC_OFFSET_SECS: i32 = 8 * 3600;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// The controller's local zone (UTC+8).
pub fn controller_tz() -> FixedOffset {
    FixedOffset::east_opt(CONTROLLER_UTC_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

/// Interpret epoch milliseconds as an instant in the controller zone.
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.with_timezone(&controller_tz()))
}

/// Combined traffic in MB, rounded to two decimals.
pub fn traffic_mb(download_bytes: u64, upload_bytes: u64) -> f64 {
    let total = download_bytes.saturating_add(upload_bytes) as f64 / BYTES_PER_MB;
    (total * 100.0).round() / 100.0
}

/// Query window for past connections, in absolute UTC epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    /// The trailing `span` ending at `now`, evaluated in the controller zone.
    pub fn trailing(now: DateTime<Utc>, span: Duration) -> Self {
        let end = now.with_timezone(&controller_tz());
        let start = end - span;
        TimeWindow {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
        }
    }
}

impl ConnectionRecord {
    /// Build the shared field/tag slots for this session.
    ///
    /// Returns `None` when mac, first_seen or last_seen is missing. Empty
    /// mac and zero timestamps count as missing.
    pub fn session_traffic(&self, province: &str, site: &str) -> Option<SessionTraffic> {
        // ---
        let mac = self.mac.as_deref().filter(|m| !m.is_empty())?;
        let first_ms = self.first_seen.filter(|ms| *ms != 0)?;
        let last_ms = self.last_seen.filter(|ms| *ms != 0)?;

        let first_seen = from_epoch_millis(first_ms)?;
        let last_seen = from_epoch_millis(last_ms)?;

        let tags = PointTags {
            province: province.to_string(),
            site: site.to_string(),
            mac: mac.to_string(),
            device: self.name.clone().unwrap_or_default(),
            ssid: self.ssid.clone().unwrap_or_default(),
            ap_name: self.device_name.clone().unwrap_or_default(),
            session_id: format!("{}_{}_{}", mac, first_ms, last_ms),
        };

        Some(SessionTraffic {
            total_traffic_mb: traffic_mb(
                self.download_bytes.unwrap_or(0),
                self.upload_bytes.unwrap_or(0),
            ),
            tags,
            first_seen,
            last_seen,
        })
    }
}

/// Convert records into points, two per valid record, preserving order.
pub fn transform(records: &[ConnectionRecord], province: &str, site: &str) -> Vec<TrafficPoint> {
    // ---
    records
        .iter()
        .filter_map(|record| record.session_traffic(province, site))
        .flat_map(|session| session.points())
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Timelike};

    const FIRST: i64 = 1_718_000_000_000;
    const LAST: i64 = 1_718_000_300_000;

    fn create_test_record(mac: &str, ssid: &str) -> ConnectionRecord {
        // ---
        ConnectionRecord {
            mac: Some(mac.to_string()),
            name: Some("laptop".to_string()),
            device_name: Some("AP-Hall".to_string()),
            ssid: Some(ssid.to_string()),
            first_seen: Some(FIRST),
            last_seen: Some(LAST),
            duration: Some(300),
            download_bytes: Some(500_000),
            upload_bytes: Some(500_000),
        }
    }

    #[test]
    fn test_traffic_rounding() {
        // ---
        assert_eq!(traffic_mb(500_000, 500_000), 0.95);
        assert_eq!(traffic_mb(1_048_576, 0), 1.0);
        assert_eq!(traffic_mb(0, 0), 0.0);
    }

    #[test]
    fn test_valid_record_yields_start_and_end_points() {
        // ---
        let records = vec![create_test_record("AA-BB", "Guest")];
        let points = transform(&records, "Cebu", "Main Office");

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp_millis(), FIRST);
        assert_eq!(points[1].timestamp_millis(), LAST);
        assert_eq!(points[0].tags, points[1].tags);
        assert_eq!(points[0].total_traffic_mb, points[1].total_traffic_mb);
        assert_eq!(points[0].total_traffic_mb, 0.95);
        assert_eq!(points[0].measurement(), "connection_traffic");
    }

    #[test]
    fn test_tags_are_populated() {
        // ---
        let points = transform(&[create_test_record("AA-BB", "Guest")], "Cebu", "Main");
        let tags = &points[0].tags;

        assert_eq!(tags.province, "Cebu");
        assert_eq!(tags.site, "Main");
        assert_eq!(tags.mac, "AA-BB");
        assert_eq!(tags.device, "laptop");
        assert_eq!(tags.ap_name, "AP-Hall");
        assert_eq!(tags.ssid, "Guest");
        assert_eq!(tags.session_id, format!("AA-BB_{}_{}", FIRST, LAST));
    }

    #[test]
    fn test_timestamps_carry_utc8_offset() {
        // ---
        let points = transform(&[create_test_record("AA-BB", "Guest")], "p", "s");
        let start = points[0].timestamp;

        assert_eq!(start.offset().local_minus_utc(), 8 * 3600);
        let utc = start.with_timezone(&Utc);
        assert_eq!((start.hour() + 24 - utc.hour()) % 24, 8);
    }

    #[test]
    fn test_invalid_records_are_dropped() {
        // ---
        let mut no_mac = create_test_record("AA", "Guest");
        no_mac.mac = None;
        let mut empty_mac = create_test_record("", "Guest");
        empty_mac.mac = Some(String::new());
        let mut no_first = create_test_record("BB", "Guest");
        no_first.first_seen = None;
        let mut no_last = create_test_record("CC", "Guest");
        no_last.last_seen = None;
        let mut zero_last = create_test_record("DD", "Guest");
        zero_last.last_seen = Some(0);

        let records = vec![no_mac, empty_mac, no_first, no_last, zero_last];
        assert!(transform(&records, "p", "s").is_empty());
    }

    #[test]
    fn test_order_is_preserved_around_dropped_records() {
        // ---
        let mut invalid = create_test_record("XX", "Guest");
        invalid.first_seen = None;
        let records = vec![
            create_test_record("01", "Guest"),
            invalid,
            create_test_record("02", "Guest"),
        ];

        let macs: Vec<String> = transform(&records, "p", "s")
            .into_iter()
            .map(|p| p.tags.mac)
            .collect();
        assert_eq!(macs, ["01", "01", "02", "02"]);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        // ---
        let record = ConnectionRecord {
            mac: Some("AA".to_string()),
            first_seen: Some(FIRST),
            last_seen: Some(LAST),
            ..Default::default()
        };

        let points = transform(&[record], "p", "s");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].total_traffic_mb, 0.0);
        assert_eq!(points[0].tags.device, "");
        assert_eq!(points[0].tags.ssid, "");
        assert_eq!(points[0].tags.ap_name, "");
    }

    #[test]
    fn test_session_id_ignores_ssid() {
        // ---
        // Known behavior: differing ssid does not disambiguate the session id.
        let a = transform(&[create_test_record("AA", "Guest")], "p", "s");
        let b = transform(&[create_test_record("AA", "Staff")], "p", "s");
        assert_eq!(a[0].tags.session_id, b[0].tags.session_id);
        assert_ne!(a[0].tags.ssid, b[0].tags.ssid);
    }

    #[test]
    fn test_trailing_window() {
        // ---
        let now = Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap();
        let window = TimeWindow::trailing(now, Duration::minutes(5));

        assert_eq!(window.end_ms, now.timestamp_millis());
        assert_eq!(window.start_ms, now.timestamp_millis() - 5 * 60 * 1000);
    }
}
