//! Observability for the index store
//!
//! - Structured logging (JSON lines)
//! - Typed events
//! - Counters
//!
//! Observability is read-only: it never changes what a scan returns and a
//! logging failure never reaches the caller.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{IndexMetrics, IndexMetricsSnapshot};
