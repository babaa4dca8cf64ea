//! Composite Reading Data Model
//!
//! A [`Reading`] is one time-correlated record of the sensor's state. The
//! persisted invariant - temperature and humidity always present, battery
//! optional - is enforced by the type itself: there is no way to construct a
//! `Reading` with a missing measurement. Partial state exists only inside the
//! fusion state machine and the one-shot read locals, and never reaches the
//! store.
//!
//! External collaborators (HTTP layers, automation scripts) may depend on
//! exactly five serialized fields: `timestamp`, `deviceId`, `temperature`,
//! `humidity`, `battery`.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One composite sensor reading, immutable once persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Acquisition time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Stable identifier of the source device
    pub device_id: String,
    /// Degrees Celsius, decoded from hundredths
    pub temperature: f64,
    /// Percent relative humidity, decoded from hundredths
    pub humidity: f64,
    /// Battery percentage; absent when the device did not report it
    pub battery: Option<u8>,
}

impl Reading {
    /// Assemble a reading from decoded measurements
    ///
    /// The timestamp is truncated to microsecond precision, the resolution
    /// the store persists, so a reading compares equal to itself after a
    /// save/load round trip.
    pub fn new(
        timestamp: DateTime<Utc>,
        device_id: impl Into<String>,
        temperature: f64,
        humidity: f64,
        battery: Option<u8>,
    ) -> Self {
        let timestamp = timestamp
            .with_nanosecond(timestamp.nanosecond() / 1000 * 1000)
            .unwrap_or(timestamp);
        Self {
            timestamp,
            device_id: device_id.into(),
            temperature,
            humidity,
            battery,
        }
    }

    /// Timestamp in the fixed-width form the store persists
    ///
    /// RFC 3339 UTC with microsecond precision and a `Z` suffix, so that
    /// lexicographic order over stored timestamps equals chronological order.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Reading {
        Reading::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
            "A4:C1:38:AA:BB:CC",
            25.36,
            62.34,
            Some(77),
        )
    }

    #[test]
    fn serializes_stable_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        for field in ["timestamp", "deviceId", "temperature", "humidity", "battery"] {
            assert!(obj.contains_key(field), "missing field {field}");
        }
        assert_eq!(obj.len(), 5);
        assert_eq!(obj["deviceId"], "A4:C1:38:AA:BB:CC");
    }

    #[test]
    fn absent_battery_serializes_as_null() {
        let mut reading = sample();
        reading.battery = None;
        let json = serde_json::to_value(reading).unwrap();
        assert!(json["battery"].is_null());
    }

    #[test]
    fn timestamp_text_is_fixed_width_utc() {
        let text = sample().timestamp_text();
        assert_eq!(text, "2024-06-01T12:30:00.000000Z");
        assert_eq!(text.len(), "2024-06-01T12:30:00.000000Z".len());
    }

    #[test]
    fn sub_microsecond_precision_is_truncated() {
        let nanos = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(1_234_567);
        let reading = Reading::new(nanos, "A4:C1:38:AA:BB:CC", 25.36, 62.34, None);
        assert_eq!(reading.timestamp_text(), "2024-06-01T12:30:00.001234Z");
        // Round trip through the persisted form is lossless
        let parsed = chrono::DateTime::parse_from_rfc3339(&reading.timestamp_text()).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), reading.timestamp);
    }

    #[test]
    fn timestamp_text_orders_lexicographically() {
        let early = sample();
        let mut late = sample();
        late.timestamp = early.timestamp + chrono::Duration::microseconds(1);
        assert!(early.timestamp_text() < late.timestamp_text());
    }
}
