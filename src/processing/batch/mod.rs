mod config;
mod metrics;
mod processor;

pub use config::{BatchConfig, DEFAULT_CONCURRENCY};
pub use metrics::{BatchReport, SaveFailure, SkippedFile};
pub use processor::BatchProcessor;
