//! Clinical event data models.
//!
//! An event is a maximal contiguous run of readings sharing the same
//! out-of-range classification. Its type never changes once opened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SevereHypoglycemia,
    Hypoglycemia,
    Hyperglycemia,
    SevereHyperglycemia,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SevereHypoglycemia => "severe_hypoglycemia",
            EventType::Hypoglycemia => "hypoglycemia",
            EventType::Hyperglycemia => "hyperglycemia",
            EventType::SevereHyperglycemia => "severe_hyperglycemia",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "severe_hypoglycemia" => Some(EventType::SevereHypoglycemia),
            "hypoglycemia" => Some(EventType::Hypoglycemia),
            "hyperglycemia" => Some(EventType::Hyperglycemia),
            "severe_hyperglycemia" => Some(EventType::SevereHyperglycemia),
            _ => None,
        }
    }

    /// Low-glucose events track their minimum as peak, high-glucose events their maximum.
    pub fn is_low(&self) -> bool {
        matches!(
            self,
            EventType::SevereHypoglycemia | EventType::Hypoglycemia
        )
    }

    pub fn severity(&self) -> Severity {
        match self {
            EventType::SevereHypoglycemia => Severity::Critical,
            EventType::Hypoglycemia => Severity::High,
            EventType::SevereHyperglycemia => Severity::High,
            EventType::Hyperglycemia => Severity::Medium,
        }
    }

    /// The more extreme of `current` and `candidate` for this event type.
    pub fn worse_of(&self, current: f64, candidate: f64) -> f64 {
        if self.is_low() {
            current.min(candidate)
        } else {
            current.max(candidate)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_value: f64,
    pub end_value: Option<f64>,
    pub peak_value: f64,
    pub duration_minutes: i64,
    /// Contributing readings in timestamp order.
    pub reading_ids: Vec<String>,
}

impl Event {
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Whole minutes between `start` and `end`, rounded; 0 without an end.
pub fn duration_minutes(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> i64 {
    match end {
        Some(end) => {
            let millis = (end - start).num_milliseconds() as f64;
            (millis / 60_000.0).round() as i64
        }
        None => 0,
    }
}
