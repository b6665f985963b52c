//! End-to-end ingestion: validate, resolve session, dedupe/write, detect events.

use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde_json::Value;

use crate::db::GlucoseStore;
use crate::detection::{EventDetector, ThresholdTable};
use crate::error::IngestError;
use crate::ingest::request::{IngestRequest, IngestResult, RawReading};
use crate::ingest::resolver::{resolve_session, DeviceIdentity};
use crate::ingest::writer::{write_readings, ValidReading};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

pub struct IngestPipeline<S> {
    store: S,
    detector: EventDetector,
}

impl<S: GlucoseStore> IngestPipeline<S> {
    pub fn new(store: S, thresholds: ThresholdTable) -> Self {
        Self {
            store,
            detector: EventDetector::new(thresholds),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest one batch.
    ///
    /// Malformed readings are dropped with a warning. Session and persistence
    /// failures abort the whole call; if the readings write fails, detection
    /// does not run.
    pub async fn ingest(&self, request: &IngestRequest) -> Result<IngestResult, IngestError> {
        if request.readings.is_empty() {
            return Err(IngestError::EmptyBatch);
        }

        let (valid, rejected) = validate_readings(&request.readings);
        if valid.is_empty() {
            log_warn!(
                "All {} readings from user {} were invalid; nothing ingested",
                rejected,
                request.user_id
            );
            return Err(IngestError::EmptyBatch);
        }

        let identity = DeviceIdentity {
            user_id: &request.user_id,
            device_type: request.device_type,
            sensor_id: request.sensor_id.as_deref(),
            device_serial: request.device_serial.as_deref(),
        };
        let timestamps: Vec<DateTime<Utc>> = valid.iter().map(|r| r.timestamp).collect();
        let session = resolve_session(&self.store, &identity, &timestamps).await?;

        let outcome = write_readings(&self.store, &session, &valid).await?;

        let events = self
            .detector
            .detect(&session.id, &session.user_id, &outcome.written);
        if !events.is_empty() {
            self.store.insert_events(&events).await?;
        }

        log_info!(
            "Ingested batch for session {}: created={} skipped={} rejected={} events={}",
            session.id,
            outcome.written.len(),
            outcome.skipped,
            rejected,
            events.len()
        );

        Ok(IngestResult {
            session_id: session.id,
            readings_created: outcome.written.len(),
            readings_skipped: outcome.skipped,
            events_detected: events.len(),
            readings_rejected: rejected,
        })
    }
}

/// Split a batch into valid readings and a count of dropped ones.
pub fn validate_readings(raw: &[RawReading]) -> (Vec<ValidReading>, usize) {
    let mut valid = Vec::with_capacity(raw.len());
    let mut rejected = 0;

    for (index, reading) in raw.iter().enumerate() {
        match validate_reading(index, reading) {
            Ok(reading) => valid.push(reading),
            Err(err) => {
                log_warn!("Dropping reading: {err}");
                rejected += 1;
            }
        }
    }

    (valid, rejected)
}

pub fn validate_reading(index: usize, raw: &RawReading) -> Result<ValidReading, IngestError> {
    let invalid = |reason: String| IngestError::InvalidReading { index, reason };

    let timestamp = raw
        .timestamp
        .as_str()
        .and_then(parse_timestamp)
        .ok_or_else(|| invalid(format!("malformed timestamp {}", raw.timestamp)))?;

    // Stored timestamps are fixed-width; a five-digit or signed year would not read back.
    if !(MIN_YEAR..=MAX_YEAR).contains(&timestamp.year()) {
        return Err(invalid(format!(
            "timestamp {} outside years {MIN_YEAR:04}-{MAX_YEAR}",
            raw.timestamp
        )));
    }

    let glucose_value = finite_number(&raw.glucose_value).ok_or_else(|| {
        invalid(format!(
            "glucose value {} is not a finite number",
            raw.glucose_value
        ))
    })?;

    let trend = match &raw.trend {
        Value::Null => None,
        other => Some(
            finite_number(other)
                .ok_or_else(|| invalid(format!("trend {other} is not a finite number")))?,
        ),
    };

    Ok(ValidReading {
        timestamp,
        glucose_value,
        trend,
        quality: raw.quality.unwrap_or_default(),
        raw_data: raw.raw_data.clone(),
    })
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// RFC 3339, or a zone-less ISO-8601 date-time taken as UTC. Truncated to
/// microseconds, the precision timestamps are stored at.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let parsed = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
            Utc.from_utc_datetime(&naive)
        }
    };
    Some(parsed.trunc_subsecs(6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ReadingQuality;

    fn raw(timestamp: &str, value: f64) -> RawReading {
        RawReading {
            timestamp: timestamp.into(),
            glucose_value: value.into(),
            trend: Value::Null,
            quality: None,
            raw_data: None,
        }
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let a = parse_timestamp("2024-05-01T17:00:00+09:00").unwrap();
        let b = parse_timestamp("2024-05-01T08:00:00Z").unwrap();
        let c = parse_timestamp("2024-05-01T08:00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn sub_microsecond_precision_is_dropped() {
        let ts = parse_timestamp("2024-05-01T08:00:00.123456789Z").unwrap();
        assert_eq!(ts, parse_timestamp("2024-05-01T08:00:00.123456Z").unwrap());
    }

    #[test]
    fn invalid_readings_are_dropped_individually() {
        let mut bad_trend = raw("2024-05-01T08:15:00Z", 100.0);
        bad_trend.trend = "steep".into();

        let batch = vec![
            raw("2024-05-01T08:00:00Z", 100.0),
            raw("yesterday-ish", 100.0),
            raw("2024-05-01T08:05:00Z", f64::NAN),
            raw("2024-05-01T08:10:00Z", 95.0),
            bad_trend,
        ];

        let (valid, rejected) = validate_readings(&batch);
        assert_eq!(rejected, 3);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[1].glucose_value, 95.0);
    }

    #[test]
    fn wrongly_typed_values_are_rejected() {
        let mut numeric_timestamp = raw("", 100.0);
        numeric_timestamp.timestamp = serde_json::json!(12345);
        let mut missing_value = raw("2024-05-01T08:00:00Z", 100.0);
        missing_value.glucose_value = Value::Null;
        let mut text_value = raw("2024-05-01T08:00:00Z", 100.0);
        text_value.glucose_value = "high".into();

        for reading in [numeric_timestamp, missing_value, text_value] {
            assert!(matches!(
                validate_reading(0, &reading),
                Err(IngestError::InvalidReading { .. })
            ));
        }

        let mut with_trend = raw("2024-05-01T08:00:00Z", 100.0);
        with_trend.trend = (-1.5).into();
        assert_eq!(validate_reading(0, &with_trend).unwrap().trend, Some(-1.5));
    }

    #[test]
    fn years_that_cannot_be_stored_are_rejected() {
        let err = validate_reading(1, &raw("+10000-01-01T00:00:00", 100.0)).unwrap_err();
        match err {
            IngestError::InvalidReading { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("outside years"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!(validate_reading(0, &raw("-0001-06-01T00:00:00", 100.0)).is_err());
        assert!(validate_reading(0, &raw("9999-12-31T23:59:59Z", 100.0)).is_ok());
    }

    #[test]
    fn invalid_reading_reports_its_index() {
        let err = validate_reading(4, &raw("not a time", 100.0)).unwrap_err();
        match err {
            IngestError::InvalidReading { index, reason } => {
                assert_eq!(index, 4);
                assert!(reason.contains("not a time"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn quality_defaults_to_good() {
        let reading = validate_reading(0, &raw("2024-05-01T08:00:00Z", 100.0)).unwrap();
        assert_eq!(reading.quality, ReadingQuality::Good);
    }
}
