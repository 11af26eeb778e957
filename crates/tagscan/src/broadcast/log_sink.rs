//! Run-owned, append-only log of per-file and per-page outcomes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Warning,
    Error,
    Skipped,
    Debug,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Warning => "warning",
            LogStatus::Error => "error",
            LogStatus::Skipped => "skipped",
            LogStatus::Debug => "debug",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    /// 0 for file-level entries.
    pub page: u32,
    pub status: LogStatus,
    pub message: String,
}

impl LogEntry {
    pub fn new(file_name: &str, page: u32, status: LogStatus, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            file_name: file_name.to_string(),
            page,
            status,
            message: message.into(),
        }
    }
}

/// Thread-safe sink shared between the coordinator and observers.
///
/// Entries are stored and fanned out under one lock, so every observer sees
/// them in append order.
pub struct LogSink {
    entries: Mutex<Vec<LogEntry>>,
    sender: broadcast::Sender<LogEntry>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            entries: Mutex::new(Vec::new()),
            sender,
        }
    }

    pub fn append(&self, entry: LogEntry) {
        mirror_to_tracing(&entry);

        let mut entries = self.lock();
        // no active receivers is fine
        let _ = self.sender.send(entry.clone());
        entries.push(entry);
    }

    pub fn success(&self, file_name: &str, page: u32, message: impl Into<String>) {
        self.append(LogEntry::new(file_name, page, LogStatus::Success, message));
    }

    pub fn warning(&self, file_name: &str, page: u32, message: impl Into<String>) {
        self.append(LogEntry::new(file_name, page, LogStatus::Warning, message));
    }

    pub fn error(&self, file_name: &str, page: u32, message: impl Into<String>) {
        self.append(LogEntry::new(file_name, page, LogStatus::Error, message));
    }

    pub fn skipped(&self, file_name: &str, page: u32, message: impl Into<String>) {
        self.append(LogEntry::new(file_name, page, LogStatus::Skipped, message));
    }

    pub fn debug(&self, file_name: &str, page: u32, message: impl Into<String>) {
        self.append(LogEntry::new(file_name, page, LogStatus::Debug, message));
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // entries are only ever pushed, so a poisoned vec is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(1000)
    }
}

fn mirror_to_tracing(entry: &LogEntry) {
    let file = entry.file_name.as_str();
    let page = entry.page;
    match entry.status {
        LogStatus::Error => tracing::error!(file, page, "{}", entry.message),
        LogStatus::Warning => tracing::warn!(file, page, "{}", entry.message),
        LogStatus::Success | LogStatus::Skipped => {
            tracing::info!(file, page, status = %entry.status, "{}", entry.message)
        }
        LogStatus::Debug => tracing::debug!(file, page, "{}", entry.message),
    }
}
