use crate::broadcast::batch_events::{BatchEvent, BatchEventBroadcaster};

pub trait ProgressReporter: Send + Sync {
    /// Must not block; the coordinator calls it inline.
    fn report(&self, event: BatchEvent);
}

/// Discards every event.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: BatchEvent) {}
}

/// Bridges coordinator events to a broadcast channel.
#[derive(Clone)]
pub struct BroadcastProgress {
    broadcaster: BatchEventBroadcaster,
}

impl BroadcastProgress {
    pub fn new(broadcaster: BatchEventBroadcaster) -> Self {
        Self { broadcaster }
    }

    pub fn broadcaster(&self) -> &BatchEventBroadcaster {
        &self.broadcaster
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: BatchEvent) {
        self.broadcaster.send(event);
    }
}
