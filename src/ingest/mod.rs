pub mod normalizer;
pub mod pipeline;
pub mod request;
pub mod resolver;
pub mod writer;

pub use pipeline::IngestPipeline;
pub use request::{IngestRequest, IngestResult, RawReading};
