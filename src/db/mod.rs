pub mod connection;
pub mod helpers;
mod migrations;
pub mod models;
mod repositories;
pub mod store;

pub use connection::Database;
pub use models::{
    DeviceType, Event, EventType, MonitoringSession, Reading, ReadingQuality, SessionStatus,
    Severity, TrendDirection,
};
pub use store::GlucoseStore;
