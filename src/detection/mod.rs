pub mod algorithm;
pub mod config;

pub use algorithm::EventDetector;
pub use config::ThresholdTable;
