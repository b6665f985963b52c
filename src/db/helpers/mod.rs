use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::ErrorCode;

use crate::db::models::{
    DeviceType, EventType, ReadingQuality, SessionStatus, Severity, TrendDirection,
};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

/// Fixed-width UTC form: equal instants give equal strings and lexical order is chronological.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_status(value: &str) -> Result<SessionStatus> {
    match value {
        "active" => Ok(SessionStatus::Active),
        "completed" => Ok(SessionStatus::Completed),
        other => Err(anyhow!("unknown session status {other}")),
    }
}

pub fn parse_device_type(value: &str) -> Result<DeviceType> {
    DeviceType::parse(value).ok_or_else(|| anyhow!("unknown device type {value}"))
}

pub fn parse_quality(value: &str) -> Result<ReadingQuality> {
    ReadingQuality::parse(value).ok_or_else(|| anyhow!("unknown reading quality {value}"))
}

pub fn parse_trend(value: Option<String>) -> Result<Option<TrendDirection>> {
    value
        .map(|raw| {
            TrendDirection::parse(&raw).ok_or_else(|| anyhow!("unknown trend direction {raw}"))
        })
        .transpose()
}

pub fn parse_event_type(value: &str) -> Result<EventType> {
    EventType::parse(value).ok_or_else(|| anyhow!("unknown event type {value}"))
}

pub fn parse_severity(value: &str) -> Result<Severity> {
    Severity::parse(value).ok_or_else(|| anyhow!("unknown severity {value}"))
}

/// True when the error chain carries a SQLite constraint violation.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<rusqlite::Error>()
            .and_then(|e| e.sqlite_error_code())
            == Some(ErrorCode::ConstraintViolation)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_datetimes_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 9, 59, 59).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1);

        let a = format_datetime(&earlier);
        let b = format_datetime(&later);

        assert_eq!(a, "2024-03-01T09:59:59.000000Z");
        assert!(a < b);
        assert_eq!(parse_datetime(&b, "ts").unwrap(), later);
    }

    #[test]
    fn negative_counters_are_rejected() {
        assert!(to_u64(-1, "total_readings").is_err());
        assert_eq!(to_u64(7, "total_readings").unwrap(), 7);
    }
}
