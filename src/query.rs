//! Read-only accessors over sessions, readings and events.

use chrono::{DateTime, Utc};

use crate::db::models::{DeviceType, Event, MonitoringSession, Reading};
use crate::db::GlucoseStore;
use crate::error::StoreResult;

pub struct GlucoseQueries<'a, S: GlucoseStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GlucoseStore + ?Sized> GlucoseQueries<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn get_session(&self, session_id: &str) -> StoreResult<Option<MonitoringSession>> {
        self.store.get_session(session_id).await
    }

    /// Most recent active session; any device type unless one is given.
    pub async fn get_active_session(
        &self,
        user_id: &str,
        device_type: Option<DeviceType>,
    ) -> StoreResult<Option<MonitoringSession>> {
        self.store.latest_active_session(user_id, device_type).await
    }

    /// All sessions for a user, newest first.
    pub async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<MonitoringSession>> {
        self.store.list_sessions(user_id).await
    }

    /// Readings with `start <= timestamp <= end`, oldest first.
    pub async fn get_readings(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Reading>> {
        if start > end {
            return Ok(Vec::new());
        }
        self.store.readings_in_range(user_id, start, end).await
    }

    /// Events starting within `[start, end]`, oldest first.
    pub async fn get_events(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        if start > end {
            return Ok(Vec::new());
        }
        self.store.events_in_range(user_id, start, end).await
    }

    pub async fn get_session_events(&self, session_id: &str) -> StoreResult<Vec<Event>> {
        self.store.events_for_session(session_id).await
    }
}
