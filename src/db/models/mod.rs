pub mod event;
pub mod reading;
pub mod session;

pub use event::{duration_minutes, Event, EventType, Severity};
pub use reading::{Reading, ReadingQuality, TrendDirection};
pub use session::{DeviceType, MonitoringSession, SessionStatus};
