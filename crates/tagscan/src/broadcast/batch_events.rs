//! Typed batch events for hosts that observe a run.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::broadcast::log_sink::LogEntry;
use crate::pipeline::page::PageResult;
use crate::pipeline::state::BatchState;

/// Outcome of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Completed,
    Error,
    Cancelled,
}

/// Payload of the single completion notification every run emits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub state: BatchState,
    pub success: bool,
    pub message: String,
    pub results: Vec<PageResult>,
    pub logs: Vec<LogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn item_count(&self) -> usize {
        self.results.iter().map(|page| page.items.len()).sum()
    }
}

/// `index` is 1-based.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BatchEvent {
    FileStarted {
        name: String,
        index: usize,
        total: usize,
    },
    FileFinished {
        name: String,
        index: usize,
        total: usize,
        status: FileStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ProgressPercent {
        value: f64,
    },
    RunCompleted(RunSummary),
}

#[derive(Clone)]
pub struct BatchEventBroadcaster {
    sender: broadcast::Sender<BatchEvent>,
}

impl BatchEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Never blocks; receivers that fall behind lose the oldest events.
    pub fn send(&self, event: BatchEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.sender.subscribe()
    }
}

impl Default for BatchEventBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}
