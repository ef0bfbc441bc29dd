//! Tracing setup and the event log worker shared by the simulation binary.

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Background consumer that turns bus events into log lines.
pub mod event_log;

pub use event_log::{EventLogSummary, EventLogWorker, WorkerHandle};
