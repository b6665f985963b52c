//! Deduplicates validated readings against the session and writes the rest.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{MonitoringSession, Reading, ReadingQuality};
use crate::db::GlucoseStore;
use crate::error::StoreError;
use crate::ingest::normalizer::normalize;
use crate::{log_debug, log_info};

const ENABLE_LOGS: bool = true;

/// A raw reading that passed validation.
#[derive(Debug, Clone)]
pub struct ValidReading {
    pub timestamp: DateTime<Utc>,
    pub glucose_value: f64,
    pub trend: Option<f64>,
    pub quality: ReadingQuality,
    pub raw_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Newly persisted readings in arrival order.
    pub written: Vec<Reading>,
    pub skipped: usize,
}

/// Write every reading whose timestamp is new for the session.
///
/// Readings already stored at the same timestamp are skipped, as are repeats
/// of a timestamp earlier in the same batch. The remaining readings and the
/// session counter are written in one atomic store call; on failure nothing
/// is reported as written.
pub async fn write_readings<S: GlucoseStore + ?Sized>(
    store: &S,
    session: &MonitoringSession,
    readings: &[ValidReading],
) -> Result<WriteOutcome, StoreError> {
    let mut pending = Vec::with_capacity(readings.len());
    let mut seen = HashSet::with_capacity(readings.len());
    let mut skipped = 0;

    for raw in readings {
        if !seen.insert(raw.timestamp) {
            log_debug!("Duplicate timestamp {} within batch; skipping", raw.timestamp);
            skipped += 1;
            continue;
        }

        if store.reading_exists(&session.id, raw.timestamp).await? {
            skipped += 1;
            continue;
        }

        pending.push(build_reading(session, raw));
    }

    if !pending.is_empty() {
        let total = store.append_readings(&session.id, &pending).await?;
        log_info!(
            "Wrote {} readings to session {} (total {}, skipped {})",
            pending.len(),
            session.id,
            total,
            skipped
        );
    }

    Ok(WriteOutcome {
        written: pending,
        skipped,
    })
}

fn build_reading(session: &MonitoringSession, raw: &ValidReading) -> Reading {
    let normalized = normalize(raw.glucose_value, raw.trend);

    Reading {
        id: Uuid::new_v4().to_string(),
        session_id: session.id.clone(),
        user_id: session.user_id.clone(),
        timestamp: raw.timestamp,
        glucose_mg_dl: normalized.mg_dl,
        glucose_mmol_l: normalized.mmol_l,
        trend_rate: raw.trend,
        trend_direction: normalized.trend,
        quality: raw.quality,
        raw_data: raw.raw_data.clone(),
        created_at: Utc::now(),
    }
}
