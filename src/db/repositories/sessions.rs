use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{
        format_datetime, parse_datetime, parse_device_type, parse_optional_datetime,
        parse_status, to_i64, to_u64,
    },
    models::{DeviceType, MonitoringSession, SessionStatus},
};

const SESSION_COLUMNS: &str = "id, user_id, device_type, device_serial, sensor_id, started_at, ended_at, status, total_readings, created_at, updated_at";

fn row_to_session(row: &Row) -> Result<MonitoringSession> {
    let device_type: String = row.get("device_type")?;
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let status: String = row.get("status")?;
    let total_readings: i64 = row.get("total_readings")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(MonitoringSession {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        device_type: parse_device_type(&device_type)?,
        device_serial: row.get("device_serial")?,
        sensor_id: row.get("sensor_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        status: parse_status(&status)?,
        total_readings: to_u64(total_readings, "total_readings")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_session(&self, session: &MonitoringSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO monitoring_sessions (id, user_id, device_type, device_serial, sensor_id, started_at, ended_at, status, total_readings, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.user_id,
                    record.device_type.as_str(),
                    record.device_serial,
                    record.sensor_id,
                    format_datetime(&record.started_at),
                    record.ended_at.as_ref().map(format_datetime),
                    record.status.as_str(),
                    to_i64(record.total_readings)?,
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<MonitoringSession>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {SESSION_COLUMNS} FROM monitoring_sessions WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![session_id])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    /// Most recently started active session for a user, optionally restricted to one device type.
    pub async fn get_active_session(
        &self,
        user_id: &str,
        device_type: Option<DeviceType>,
    ) -> Result<Option<MonitoringSession>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {SESSION_COLUMNS}
                 FROM monitoring_sessions
                 WHERE user_id = ?1
                   AND status = 'active'
                   AND (?2 IS NULL OR device_type = ?2)
                 ORDER BY started_at DESC
                 LIMIT 1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![user_id, device_type.map(|d| d.as_str())])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    pub async fn list_sessions_for_user(&self, user_id: &str) -> Result<Vec<MonitoringSession>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {SESSION_COLUMNS}
                 FROM monitoring_sessions
                 WHERE user_id = ?1
                 ORDER BY started_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![user_id])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Close an active session. Completed sessions are left untouched.
    pub async fn mark_session_completed(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE monitoring_sessions
                 SET status = ?1,
                     ended_at = ?2,
                     updated_at = ?3
                 WHERE id = ?4 AND status = 'active'",
                params![
                    SessionStatus::Completed.as_str(),
                    format_datetime(&ended_at),
                    format_datetime(&Utc::now()),
                    session_id,
                ],
            )?;

            if rows_affected == 0 {
                let exists: Option<String> = conn
                    .query_row(
                        "SELECT id FROM monitoring_sessions WHERE id = ?1",
                        params![session_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if exists.is_none() {
                    return Err(anyhow::anyhow!("Session not found"));
                }
            }

            Ok(())
        })
        .await
    }
}
