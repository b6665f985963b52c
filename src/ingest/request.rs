//! Wire types exchanged with the transport layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::{DeviceType, ReadingQuality};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub user_id: String,
    pub device_type: DeviceType,
    #[serde(default)]
    pub device_serial: Option<String>,
    #[serde(default)]
    pub sensor_id: Option<String>,
    pub readings: Vec<RawReading>,
}

/// A reading as sent by the device, before validation.
///
/// `timestamp`, `glucose_value` and `trend` are kept as raw JSON so a
/// wrongly typed value drops only its own reading during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    /// ISO-8601 / RFC 3339 timestamp string.
    #[serde(default)]
    pub timestamp: Value,
    /// mg/dL.
    #[serde(default)]
    pub glucose_value: Value,
    /// Rate of change in mg/dL per minute; `null` or absent when unknown.
    #[serde(default)]
    pub trend: Value,
    #[serde(default)]
    pub quality: Option<ReadingQuality>,
    #[serde(default)]
    pub raw_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub session_id: String,
    pub readings_created: usize,
    pub readings_skipped: usize,
    pub events_detected: usize,
    /// Readings dropped as malformed before any write.
    pub readings_rejected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_from_camel_case_json() {
        let json = r#"{
            "userId": "user-1",
            "deviceType": "dexcom_g7",
            "sensorId": "SN-42",
            "readings": [
                { "timestamp": "2024-05-01T08:00:00Z", "glucoseValue": 112, "trend": -1.4 },
                { "timestamp": "2024-05-01T08:05:00+09:00", "glucoseValue": 64.5, "quality": "poor",
                  "rawData": { "packet": 7 } }
            ]
        }"#;

        let request: IngestRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.device_type, DeviceType::DexcomG7);
        assert_eq!(request.sensor_id.as_deref(), Some("SN-42"));
        assert!(request.device_serial.is_none());
        assert_eq!(request.readings.len(), 2);
        assert_eq!(request.readings[0].trend, -1.4);
        assert!(request.readings[1].trend.is_null());
        assert!(request.readings[0].quality.is_none());
        assert_eq!(request.readings[1].quality, Some(ReadingQuality::Poor));
        assert_eq!(request.readings[1].raw_data.as_ref().unwrap()["packet"], 7);
    }

    #[test]
    fn wrongly_typed_reading_fields_do_not_fail_the_request() {
        let json = r#"{
            "userId": "user-1",
            "deviceType": "freestyle_libre_3",
            "readings": [
                { "timestamp": "2024-05-01T08:00:00Z", "glucoseValue": 112 },
                { "timestamp": "2024-05-01T08:05:00Z", "glucoseValue": null },
                { "timestamp": 12345, "glucoseValue": 98 },
                { "glucoseValue": 101, "trend": "up" }
            ]
        }"#;

        let request: IngestRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.device_type, DeviceType::FreestyleLibre3);
        assert_eq!(request.readings.len(), 4);
        assert!(request.readings[1].glucose_value.is_null());
        assert_eq!(request.readings[2].timestamp, 12345);
        assert!(request.readings[3].timestamp.is_null());
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = IngestResult {
            session_id: "s1".into(),
            readings_created: 3,
            readings_skipped: 1,
            events_detected: 2,
            readings_rejected: 0,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["readingsCreated"], 3);
        assert_eq!(value["readingsSkipped"], 1);
        assert_eq!(value["eventsDetected"], 2);
    }
}
