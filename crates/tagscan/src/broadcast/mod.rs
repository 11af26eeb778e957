//! Observer-facing surfaces of a run: typed batch events and the run log.

pub mod batch_events;
pub mod log_sink;

pub use batch_events::{BatchEvent, BatchEventBroadcaster, FileStatus, RunSummary};
pub use log_sink::{LogEntry, LogSink, LogStatus};
