use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde_json::{from_str, to_string};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_quality, parse_trend, to_i64, to_u64},
    models::Reading,
};

const READING_COLUMNS: &str = "id, session_id, user_id, timestamp, glucose_mg_dl, glucose_mmol_l, trend_rate, trend_direction, quality, raw_data, created_at";

fn row_to_reading(row: &Row) -> Result<Reading> {
    let timestamp: String = row.get("timestamp")?;
    let trend_direction: Option<String> = row.get("trend_direction")?;
    let quality: String = row.get("quality")?;
    let raw_data: Option<String> = row.get("raw_data")?;
    let created_at: String = row.get("created_at")?;

    let raw_data = raw_data
        .map(|json| from_str(&json))
        .transpose()
        .context("failed to parse raw_data")?;

    Ok(Reading {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        user_id: row.get("user_id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        glucose_mg_dl: row.get("glucose_mg_dl")?,
        glucose_mmol_l: row.get("glucose_mmol_l")?,
        trend_rate: row.get("trend_rate")?,
        trend_direction: parse_trend(trend_direction)?,
        quality: parse_quality(&quality)?,
        raw_data,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn reading_exists(&self, session_id: &str, timestamp: DateTime<Utc>) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM glucose_readings WHERE session_id = ?1 AND timestamp = ?2",
                params![session_id, format_datetime(&timestamp)],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    /// Batch insert readings and bump the session's reading counter in one
    /// transaction. Returns the session's new total.
    pub async fn append_readings(&self, session_id: &str, readings: &[Reading]) -> Result<u64> {
        let session_id = session_id.to_string();
        let readings = readings.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO glucose_readings (
                        id,
                        session_id,
                        user_id,
                        timestamp,
                        glucose_mg_dl,
                        glucose_mmol_l,
                        trend_rate,
                        trend_direction,
                        quality,
                        raw_data,
                        created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )?;

                for reading in &readings {
                    let raw_data = reading
                        .raw_data
                        .as_ref()
                        .map(to_string)
                        .transpose()
                        .context("failed to serialize raw_data")?;

                    stmt.execute(params![
                        reading.id,
                        reading.session_id,
                        reading.user_id,
                        format_datetime(&reading.timestamp),
                        reading.glucose_mg_dl,
                        reading.glucose_mmol_l,
                        reading.trend_rate,
                        reading.trend_direction.map(|t| t.as_str()),
                        reading.quality.as_str(),
                        raw_data,
                        format_datetime(&reading.created_at),
                    ])
                    .with_context(|| {
                        format!("failed to insert reading at {}", reading.timestamp)
                    })?;
                }
            }

            let rows_affected = tx.execute(
                "UPDATE monitoring_sessions
                 SET total_readings = total_readings + ?1,
                     updated_at = ?2
                 WHERE id = ?3",
                params![
                    to_i64(readings.len() as u64)?,
                    format_datetime(&Utc::now()),
                    session_id,
                ],
            )?;
            if rows_affected == 0 {
                return Err(anyhow::anyhow!("Session not found"));
            }

            let total: i64 = tx.query_row(
                "SELECT total_readings FROM monitoring_sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            to_u64(total, "total_readings")
        })
        .await
    }

    /// Readings for a user with `start <= timestamp <= end`, oldest first.
    pub async fn get_readings_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {READING_COLUMNS}
                 FROM glucose_readings
                 WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
                 ORDER BY timestamp ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                user_id,
                format_datetime(&start),
                format_datetime(&end)
            ])?;

            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                readings.push(row_to_reading(row)?);
            }
            Ok(readings)
        })
        .await
    }
}
