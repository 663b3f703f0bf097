//! Data models for the collector: deployment credentials, controller
//! payloads, and the time-series points derived from them.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

// ---

/// Measurement name every point is written under.
pub const MEASUREMENT: &str = "connection_traffic";

/// The single numeric field carried by each point.
pub const TRAFFIC_FIELD: &str = "total_traffic_MB";

/// Credentials for one controller deployment ("province").
#[derive(Clone, Deserialize)]
pub struct DeploymentCredentials {
    // ---
    #[serde(rename = "url")]
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub omadac_id: String,
}

impl std::fmt::Debug for DeploymentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentCredentials")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("omadac_id", &self.omadac_id)
            .finish()
    }
}

/// A manageable site under a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    // ---
    pub site_id: String,
    pub name: String,
}

/// Raw past-connection record as returned by the controller.
///
/// Every field is optional on the wire; [`ConnectionRecord::session_traffic`]
/// decides whether the record is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    // ---
    pub mac: Option<String>,
    pub name: Option<String>,
    pub device_name: Option<String>,
    pub ssid: Option<String>,
    pub first_seen: Option<i64>,
    pub last_seen: Option<i64>,
    pub duration: Option<i64>,
    #[serde(rename = "download")]
    pub download_bytes: Option<u64>,
    #[serde(rename = "upload")]
    pub upload_bytes: Option<u64>,
}

/// Tag set shared by the start and end point of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTags {
    // ---
    pub province: String,
    pub site: String,
    pub mac: String,
    pub device: String,
    pub ssid: String,
    pub ap_name: String,
    pub session_id: String,
}

impl PointTags {
    /// Tag key/value pairs in write order.
    pub fn pairs(&self) -> [(&'static str, &str); 7] {
        [
            ("province", &self.province),
            ("site", &self.site),
            ("mac", &self.mac),
            ("device", &self.device),
            ("ssid", &self.ssid),
            ("ap_name", &self.ap_name),
            ("session_id", &self.session_id),
        ]
    }
}

/// Field and tag slots for one session, built once and stamped twice.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTraffic {
    // ---
    pub total_traffic_mb: f64,
    pub tags: PointTags,
    pub first_seen: DateTime<FixedOffset>,
    pub last_seen: DateTime<FixedOffset>,
}

impl SessionTraffic {
    /// Materialize the point at `timestamp`.
    pub fn at(&self, timestamp: DateTime<FixedOffset>) -> TrafficPoint {
        TrafficPoint {
            timestamp,
            total_traffic_mb: self.total_traffic_mb,
            tags: self.tags.clone(),
        }
    }

    /// Start-of-session and end-of-session points, in that order.
    pub fn points(&self) -> [TrafficPoint; 2] {
        [self.at(self.first_seen), self.at(self.last_seen)]
    }
}

/// One `connection_traffic` point ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficPoint {
    // ---
    pub timestamp: DateTime<FixedOffset>,
    pub total_traffic_mb: f64,
    pub tags: PointTags,
}

impl TrafficPoint {
    pub fn measurement(&self) -> &'static str {
        MEASUREMENT
    }

    /// Timestamp as absolute UTC epoch milliseconds.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_connection_record_from_controller_json() {
        // ---
        let json = serde_json::json!({
            "mac": "AA-BB-CC-DD-EE-FF",
            "name": "phone",
            "deviceName": "AP-Lobby",
            "ssid": "Guest",
            "firstSeen": 1_718_000_000_000_i64,
            "lastSeen": 1_718_000_060_000_i64,
            "duration": 60,
            "download": 500_000,
            "upload": 250_000,
            "extra": "ignored"
        });

        let record: ConnectionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.mac.as_deref(), Some("AA-BB-CC-DD-EE-FF"));
        assert_eq!(record.device_name.as_deref(), Some("AP-Lobby"));
        assert_eq!(record.first_seen, Some(1_718_000_000_000));
        assert_eq!(record.download_bytes, Some(500_000));
        assert_eq!(record.upload_bytes, Some(250_000));
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        // ---
        let record: ConnectionRecord =
            serde_json::from_value(serde_json::json!({ "mac": null })).unwrap();
        assert!(record.mac.is_none());
        assert!(record.first_seen.is_none());
        assert!(record.download_bytes.is_none());
    }

    #[test]
    fn test_credentials_use_url_key_and_hide_secret() {
        // ---
        let creds: DeploymentCredentials = serde_json::from_value(serde_json::json!({
            "url": "https://omada.example.com",
            "client_id": "cid",
            "client_secret": "top-secret",
            "omadac_id": "oid"
        }))
        .unwrap();

        assert_eq!(creds.base_url, "https://omada.example.com");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_tag_pairs_order() {
        // ---
        let tags = PointTags {
            province: "p".into(),
            site: "s".into(),
            mac: "m".into(),
            device: "d".into(),
            ssid: "w".into(),
            ap_name: "a".into(),
            session_id: "m_1_2".into(),
        };
        let keys: Vec<&str> = tags.pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["province", "site", "mac", "device", "ssid", "ap_name", "session_id"]
        );
    }
}
