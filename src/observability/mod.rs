//! Observability module
//!
//! Logging, metrics, and structured event infrastructure for monitoring
//! engine runs.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, RunSummary, StopReason};
pub use logging::init_logging;
pub use metrics::init_metrics;
