//! Shared types for the Memex workspace: error classification, config
//! loading, and date/time helpers used by the record store, the index
//! adapter, the capture pipeline, and the tool service.
pub mod config;
pub mod error;
pub mod metrics;
pub mod time;

pub use config::{ConfigLoadError, MemexConfig};
pub use error::{Classify, CoreError, ErrorKind};
pub use metrics::{CaptureMetrics, ToolMetrics};
pub use time::EpochMillis;
