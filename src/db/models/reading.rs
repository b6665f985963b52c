//! Glucose reading data model.
//!
//! One timestamped glucose measurement. Readings are immutable once written
//! and `(session_id, timestamp)` is unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    RisingFast,
    Rising,
    Stable,
    Falling,
    FallingFast,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::RisingFast => "rising_fast",
            TrendDirection::Rising => "rising",
            TrendDirection::Stable => "stable",
            TrendDirection::Falling => "falling",
            TrendDirection::FallingFast => "falling_fast",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rising_fast" => Some(TrendDirection::RisingFast),
            "rising" => Some(TrendDirection::Rising),
            "stable" => Some(TrendDirection::Stable),
            "falling" => Some(TrendDirection::Falling),
            "falling_fast" => Some(TrendDirection::FallingFast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadingQuality {
    #[default]
    Good,
    Acceptable,
    Poor,
    Invalid,
}

impl ReadingQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingQuality::Good => "good",
            ReadingQuality::Acceptable => "acceptable",
            ReadingQuality::Poor => "poor",
            ReadingQuality::Invalid => "invalid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "good" => Some(ReadingQuality::Good),
            "acceptable" => Some(ReadingQuality::Acceptable),
            "poor" => Some(ReadingQuality::Poor),
            "invalid" => Some(ReadingQuality::Invalid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Native unit (mg/dL).
    pub glucose_mg_dl: f64,
    /// Derived once from `glucose_mg_dl`, stored at full precision.
    pub glucose_mmol_l: f64,
    /// Change per minute in mg/dL.
    pub trend_rate: Option<f64>,
    pub trend_direction: Option<TrendDirection>,
    pub quality: ReadingQuality,
    pub raw_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
