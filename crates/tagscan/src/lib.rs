pub mod broadcast;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod processor;

pub use broadcast::{
    BatchEvent, BatchEventBroadcaster, FileStatus, LogEntry, LogSink, LogStatus, RunSummary,
};
pub use classifier::{ClassifiedItem, Classifier};
pub use config::{load_config, load_config_from_str, Config};
pub use dedup::deduplicate;
pub use error::{ConfigError, DecodeError, ExportError, InputError, OcrError, Result, TagscanError};
pub use export::{Exporter, SqliteExporter};
pub use pipeline::{
    BatchConfig, BatchCoordinator, BatchOutcome, BatchState, BroadcastProgress, CancelHandle,
    NoopProgress, PageExtractor, PageResult, ProgressReporter,
};
pub use processor::ocr::{OcrEngine, OcrOutput, TesseractOcr};
pub use processor::{DecoderRegistry, DocumentDecoder, RawPage};
