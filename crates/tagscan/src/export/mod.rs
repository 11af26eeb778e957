pub mod sqlite;

use std::path::{Path, PathBuf};

use crate::broadcast::log_sink::LogEntry;
use crate::error::ExportError;
use crate::pipeline::page::PageResult;

pub use sqlite::SqliteExporter;

/// Export collaborator. Writes the merged results and the run log below
/// `output_dir`, returning the location written.
pub trait Exporter: Send + Sync {
    fn export(
        &self,
        output_dir: &Path,
        results: &[PageResult],
        logs: &[LogEntry],
    ) -> Result<PathBuf, ExportError>;
}
