//! Finds or opens the monitoring session a batch belongs to.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{DeviceType, MonitoringSession, SessionStatus};
use crate::db::GlucoseStore;
use crate::error::{IngestError, StoreError};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Identity of the device feeding a batch.
#[derive(Debug, Clone)]
pub struct DeviceIdentity<'a> {
    pub user_id: &'a str,
    pub device_type: DeviceType,
    pub sensor_id: Option<&'a str>,
    pub device_serial: Option<&'a str>,
}

/// Return the active session for the device, rotating it when the sensor changed.
///
/// A new session starts at the earliest incoming timestamp, so backlogged
/// data keeps its historical start.
pub async fn resolve_session<S: GlucoseStore + ?Sized>(
    store: &S,
    identity: &DeviceIdentity<'_>,
    incoming_timestamps: &[DateTime<Utc>],
) -> Result<MonitoringSession, IngestError> {
    let started_at = incoming_timestamps
        .iter()
        .min()
        .copied()
        .ok_or(IngestError::EmptyBatch)?;

    if let Some(session) = store
        .find_active_session(identity.user_id, identity.device_type)
        .await?
    {
        if !session.sensor_changed(identity.sensor_id) {
            return Ok(session);
        }

        log_info!(
            "Sensor changed for user {} on {} ({:?} -> {:?}); completing session {}",
            identity.user_id,
            identity.device_type,
            session.sensor_id,
            identity.sensor_id,
            session.id
        );
        store.complete_session(&session.id, Utc::now()).await?;
    }

    let now = Utc::now();
    let session = MonitoringSession {
        id: Uuid::new_v4().to_string(),
        user_id: identity.user_id.to_string(),
        device_type: identity.device_type,
        device_serial: identity.device_serial.map(str::to_string),
        sensor_id: identity.sensor_id.map(str::to_string),
        started_at,
        ended_at: None,
        status: SessionStatus::Active,
        total_readings: 0,
        created_at: now,
        updated_at: now,
    };

    match store.create_session(&session).await {
        Ok(()) => {
            log_info!(
                "Opened session {} for user {} on {}",
                session.id,
                session.user_id,
                session.device_type
            );
            Ok(session)
        }
        Err(StoreError::Conflict(reason)) => {
            log_warn!("Session creation raced ({reason}); retrying lookup once");
            store
                .find_active_session(identity.user_id, identity.device_type)
                .await?
                .ok_or_else(|| IngestError::SessionConflict {
                    user_id: identity.user_id.to_string(),
                    device_type: identity.device_type,
                })
        }
        Err(err) => Err(err.into()),
    }
}
