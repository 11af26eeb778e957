pub mod config;
pub mod page;
pub mod progress;
pub mod runner;
pub mod state;

pub use config::BatchConfig;
pub use page::{PageExtractor, PageResult};
pub use progress::{BroadcastProgress, NoopProgress, ProgressReporter};
pub use runner::{BatchCoordinator, BatchOutcome};
pub use state::{BatchState, CancelHandle};
