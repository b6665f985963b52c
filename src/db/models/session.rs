//! Monitoring session data models.
//!
//! A session is a bounded period of continuous monitoring by one sensor for
//! one user/device pair. Sessions are only ever appended to (reading counter)
//! or closed, never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    DexcomG6,
    DexcomG7,
    FreestyleLibre,
    #[serde(rename = "freestyle_libre_3")]
    FreestyleLibre3,
    MedtronicGuardian,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::DexcomG6 => "dexcom_g6",
            DeviceType::DexcomG7 => "dexcom_g7",
            DeviceType::FreestyleLibre => "freestyle_libre",
            DeviceType::FreestyleLibre3 => "freestyle_libre_3",
            DeviceType::MedtronicGuardian => "medtronic_guardian",
            DeviceType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dexcom_g6" => Some(DeviceType::DexcomG6),
            "dexcom_g7" => Some(DeviceType::DexcomG7),
            "freestyle_libre" => Some(DeviceType::FreestyleLibre),
            "freestyle_libre_3" => Some(DeviceType::FreestyleLibre3),
            "medtronic_guardian" => Some(DeviceType::MedtronicGuardian),
            "other" => Some(DeviceType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSession {
    pub id: String,
    pub user_id: String,
    pub device_type: DeviceType,
    pub device_serial: Option<String>,
    /// Physical sensor currently feeding this session.
    pub sensor_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_readings: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonitoringSession {
    /// True when `incoming` names a sensor other than the one on record.
    /// A batch without a sensor id never counts as a change.
    pub fn sensor_changed(&self, incoming: Option<&str>) -> bool {
        match incoming {
            Some(sensor) => self.sensor_id.as_deref() != Some(sensor),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_stored_names() {
        for device in [
            DeviceType::DexcomG6,
            DeviceType::DexcomG7,
            DeviceType::FreestyleLibre,
            DeviceType::FreestyleLibre3,
            DeviceType::MedtronicGuardian,
            DeviceType::Other,
        ] {
            let json = serde_json::to_string(&device).unwrap();
            assert_eq!(json, format!("\"{}\"", device.as_str()));
            assert_eq!(DeviceType::parse(device.as_str()), Some(device));
        }
    }

    #[test]
    fn missing_incoming_sensor_is_not_a_change() {
        let now = chrono::Utc::now();
        let session = MonitoringSession {
            id: "s1".into(),
            user_id: "u1".into(),
            device_type: DeviceType::DexcomG7,
            device_serial: None,
            sensor_id: None,
            started_at: now,
            ended_at: None,
            status: SessionStatus::Active,
            total_readings: 0,
            created_at: now,
            updated_at: now,
        };

        assert!(!session.sensor_changed(None));
        assert!(session.sensor_changed(Some("S1")));
    }
}
