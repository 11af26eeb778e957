use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Lifecycle of one batch run. Everything but `Idle` and `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Cancelled | BatchState::Failed
        )
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchState::Idle => write!(f, "Idle"),
            BatchState::Running => write!(f, "Running"),
            BatchState::Completed => write!(f, "Completed"),
            BatchState::Cancelled => write!(f, "Cancelled"),
            BatchState::Failed => write!(f, "Failed"),
        }
    }
}

/// Cooperative cancellation signal. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent; safe from any thread, including signal handlers.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Counters of the run in flight. Owned by the coordinator and dropped with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BatchRun {
    pub total_files: usize,
    pub processed_files: usize,
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_files: usize,
    last_percent: f64,
}

impl BatchRun {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    /// Overall progress with the current file `pages_done / pages_in_file`
    /// complete. Never decreases across calls.
    pub fn percent(&mut self, pages_done: usize, pages_in_file: usize) -> f64 {
        let file_fraction = if pages_in_file == 0 {
            0.0
        } else {
            pages_done as f64 / pages_in_file as f64
        };
        let raw = if self.total_files == 0 {
            100.0
        } else {
            (self.processed_files as f64 + file_fraction) / self.total_files as f64 * 100.0
        };

        self.last_percent = raw.clamp(self.last_percent, 100.0);
        self.last_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!BatchState::Idle.is_terminal());
        assert!(!BatchState::Running.is_terminal());
        assert!(BatchState::Completed.is_terminal());
        assert!(BatchState::Cancelled.is_terminal());
        assert!(BatchState::Failed.is_terminal());
    }

    #[test]
    fn test_cancel_is_shared_and_idempotent() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_cancelled());

        clone.cancel();
        clone.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_percent_tracks_pages_and_files() {
        let mut run = BatchRun::new(2);
        assert_eq!(run.percent(1, 2), 25.0);
        assert_eq!(run.percent(2, 2), 50.0);
        run.processed_files = 1;
        assert_eq!(run.percent(0, 4), 50.0);
        assert_eq!(run.percent(2, 4), 75.0);
        run.processed_files = 2;
        assert_eq!(run.percent(0, 0), 100.0);
    }

    #[test]
    fn test_percent_never_decreases() {
        let mut run = BatchRun::new(2);
        assert_eq!(run.percent(3, 4), 37.5);
        assert_eq!(run.percent(0, 0), 37.5);
        assert_eq!(run.percent(1, 4), 37.5);
    }
}
