//! Persistence boundary used by the ingestion pipeline and query façade.
//!
//! The pipeline only sees [`GlucoseStore`]. The SQLite [`Database`] is the
//! shipped implementation; tests substitute their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{
    connection::Database,
    helpers::is_constraint_violation,
    models::{DeviceType, Event, MonitoringSession, Reading},
};
use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait GlucoseStore: Send + Sync {
    /// Most recent active session for the pair, if any.
    async fn find_active_session(
        &self,
        user_id: &str,
        device_type: DeviceType,
    ) -> StoreResult<Option<MonitoringSession>>;

    /// Insert a new session.
    ///
    /// Must fail with [`StoreError::Conflict`] when an active session already
    /// exists for the same (user, device type).
    async fn create_session(&self, session: &MonitoringSession) -> StoreResult<()>;

    /// Mark a session `completed` with the given end time.
    async fn complete_session(&self, session_id: &str, ended_at: DateTime<Utc>)
        -> StoreResult<()>;

    async fn reading_exists(&self, session_id: &str, timestamp: DateTime<Utc>)
        -> StoreResult<bool>;

    /// Atomically write the readings and add their count to the session's
    /// counter. Returns the new counter value.
    async fn append_readings(&self, session_id: &str, readings: &[Reading]) -> StoreResult<u64>;

    /// Atomically write a batch of closed events.
    async fn insert_events(&self, events: &[Event]) -> StoreResult<()>;

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<MonitoringSession>>;

    async fn latest_active_session(
        &self,
        user_id: &str,
        device_type: Option<DeviceType>,
    ) -> StoreResult<Option<MonitoringSession>>;

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<MonitoringSession>>;

    async fn readings_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Reading>>;

    async fn events_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>>;

    async fn events_for_session(&self, session_id: &str) -> StoreResult<Vec<Event>>;
}

#[async_trait]
impl GlucoseStore for Database {
    async fn find_active_session(
        &self,
        user_id: &str,
        device_type: DeviceType,
    ) -> StoreResult<Option<MonitoringSession>> {
        Ok(self.get_active_session(user_id, Some(device_type)).await?)
    }

    async fn create_session(&self, session: &MonitoringSession) -> StoreResult<()> {
        self.insert_session(session).await.map_err(|err| {
            if is_constraint_violation(&err) {
                StoreError::Conflict(format!(
                    "active session already exists for user {} on {}",
                    session.user_id, session.device_type
                ))
            } else {
                StoreError::Backend(err)
            }
        })
    }

    async fn complete_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(self.mark_session_completed(session_id, ended_at).await?)
    }

    async fn reading_exists(
        &self,
        session_id: &str,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(Database::reading_exists(self, session_id, timestamp).await?)
    }

    async fn append_readings(&self, session_id: &str, readings: &[Reading]) -> StoreResult<u64> {
        Ok(Database::append_readings(self, session_id, readings).await?)
    }

    async fn insert_events(&self, events: &[Event]) -> StoreResult<()> {
        Ok(Database::insert_events(self, events).await?)
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<MonitoringSession>> {
        Ok(Database::get_session(self, session_id).await?)
    }

    async fn latest_active_session(
        &self,
        user_id: &str,
        device_type: Option<DeviceType>,
    ) -> StoreResult<Option<MonitoringSession>> {
        Ok(self.get_active_session(user_id, device_type).await?)
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<MonitoringSession>> {
        Ok(self.list_sessions_for_user(user_id).await?)
    }

    async fn readings_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Reading>> {
        Ok(self.get_readings_in_range(user_id, start, end).await?)
    }

    async fn events_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        Ok(self.get_events_in_range(user_id, start, end).await?)
    }

    async fn events_for_session(&self, session_id: &str) -> StoreResult<Vec<Event>> {
        Ok(self.get_events_for_session(session_id).await?)
    }
}
