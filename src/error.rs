//! Error taxonomy for the ingestion pipeline and its persistence boundary.

use thiserror::Error;

use crate::db::models::DeviceType;

/// Errors surfaced by a [`crate::db::GlucoseStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("uniqueness constraint violated: {0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The batch carried no usable readings; nothing was written.
    #[error("ingestion batch contains no readings")]
    EmptyBatch,

    /// Another call created the active session for this pair and it could
    /// not be found on the follow-up lookup.
    #[error("active session conflict for user {user_id} on {device_type}")]
    SessionConflict {
        user_id: String,
        device_type: DeviceType,
    },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// A single reading was malformed. Dropped from its batch with a warning;
    /// never returned from a whole ingestion call.
    #[error("invalid reading at index {index}: {reason}")]
    InvalidReading { index: usize, reason: String },
}
