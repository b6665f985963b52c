use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde_json::{from_str, to_string};

use crate::db::{
    connection::Database,
    helpers::{
        format_datetime, parse_datetime, parse_event_type, parse_optional_datetime,
        parse_severity,
    },
    models::Event,
};

const EVENT_COLUMNS: &str = "id, session_id, user_id, event_type, severity, start_time, end_time, start_value, end_value, peak_value, duration_minutes, reading_ids_json";

fn row_to_event(row: &Row) -> Result<Event> {
    let event_type: String = row.get("event_type")?;
    let severity: String = row.get("severity")?;
    let start_time: String = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let reading_ids_json: String = row.get("reading_ids_json")?;

    let reading_ids: Vec<String> =
        from_str(&reading_ids_json).context("failed to parse reading_ids_json")?;

    Ok(Event {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        user_id: row.get("user_id")?,
        event_type: parse_event_type(&event_type)?,
        severity: parse_severity(&severity)?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_optional_datetime(end_time, "end_time")?,
        start_value: row.get("start_value")?,
        end_value: row.get("end_value")?,
        peak_value: row.get("peak_value")?,
        duration_minutes: row.get("duration_minutes")?,
        reading_ids,
    })
}

impl Database {
    /// Batch insert events in a single transaction.
    pub async fn insert_events(&self, events: &[Event]) -> Result<()> {
        let events = events.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            for event in &events {
                let reading_ids_json =
                    to_string(&event.reading_ids).context("failed to serialize reading ids")?;

                tx.execute(
                    "INSERT INTO glucose_events (
                        id,
                        session_id,
                        user_id,
                        event_type,
                        severity,
                        start_time,
                        end_time,
                        start_value,
                        end_value,
                        peak_value,
                        duration_minutes,
                        reading_ids_json
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        event.id,
                        event.session_id,
                        event.user_id,
                        event.event_type.as_str(),
                        event.severity.as_str(),
                        format_datetime(&event.start_time),
                        event.end_time.as_ref().map(format_datetime),
                        event.start_value,
                        event.end_value,
                        event.peak_value,
                        event.duration_minutes,
                        reading_ids_json,
                    ],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Events for a user whose start time falls in `[start, end]`, oldest first.
    pub async fn get_events_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {EVENT_COLUMNS}
                 FROM glucose_events
                 WHERE user_id = ?1 AND start_time >= ?2 AND start_time <= ?3
                 ORDER BY start_time ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                user_id,
                format_datetime(&start),
                format_datetime(&end)
            ])?;

            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_event(row)?);
            }
            Ok(events)
        })
        .await
    }

    pub async fn get_events_for_session(&self, session_id: &str) -> Result<Vec<Event>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {EVENT_COLUMNS}
                 FROM glucose_events
                 WHERE session_id = ?1
                 ORDER BY start_time ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![session_id])?;

            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_event(row)?);
            }
            Ok(events)
        })
        .await
    }
}
