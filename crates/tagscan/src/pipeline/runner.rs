use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use crate::broadcast::batch_events::{BatchEvent, FileStatus, RunSummary};
use crate::broadcast::log_sink::LogSink;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::dedup;
use crate::error::{ConfigError, InputError, TagscanError};
use crate::export::{Exporter, SqliteExporter};
use crate::processor::ocr::{OcrEngine, TesseractOcr};
use crate::processor::{display_name, DecoderRegistry, DocumentDecoder};

use super::config::BatchConfig;
use super::page::{PageExtractor, PageResult};
use super::progress::ProgressReporter;
use super::state::{BatchRun, BatchState, CancelHandle};

/// Terminal result of [`BatchCoordinator::start`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub state: BatchState,
    pub summary: RunSummary,
    /// Set on `Failed`.
    pub error: Option<TagscanError>,
}

enum FileOutcome {
    Completed(Vec<PageResult>),
    Failed,
    Cancelled,
}

/// Drives one batch of files through decoding, page extraction, merge and
/// export.
///
/// Files and pages are processed strictly in order. A coordinator runs once:
/// [`start`](Self::start) consumes it.
pub struct BatchCoordinator {
    decoder: Arc<dyn DocumentDecoder>,
    extractor: PageExtractor,
    exporter: Arc<dyn Exporter>,
    progress: Arc<dyn ProgressReporter>,
    log: Arc<LogSink>,
    cancel: CancelHandle,
    state: BatchState,
}

impl BatchCoordinator {
    /// Production constructor: Tesseract OCR, the decoder registry and the
    /// SQLite exporter, all built from config.
    pub fn from_config(
        config: &Config,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<Self, ConfigError> {
        let classifier = Arc::new(Classifier::from_config(config)?);

        Ok(Self::new(
            &BatchConfig::from_config(config),
            classifier,
            Arc::new(DecoderRegistry::from_config(&config.ocr)),
            Arc::new(TesseractOcr::from_config(&config.ocr)),
            Arc::new(SqliteExporter::new()),
            progress,
        ))
    }

    pub fn new(
        config: &BatchConfig,
        classifier: Arc<Classifier>,
        decoder: Arc<dyn DocumentDecoder>,
        ocr: Arc<dyn OcrEngine>,
        exporter: Arc<dyn Exporter>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            decoder,
            extractor: PageExtractor::new(classifier, ocr, config),
            exporter,
            progress,
            log: Arc::new(LogSink::new(config.log_capacity)),
            cancel: CancelHandle::new(),
            state: BatchState::Idle,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The run log, for observers that subscribe before the run starts.
    pub fn log_sink(&self) -> Arc<LogSink> {
        Arc::clone(&self.log)
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Runs the batch to a terminal state. Emits exactly one
    /// [`BatchEvent::RunCompleted`].
    pub async fn start(mut self, files: Vec<PathBuf>, output: PathBuf) -> BatchOutcome {
        let span = info_span!("batch", files = files.len(), output = %output.display());
        self.run(files, output).instrument(span).await
    }

    async fn run(&mut self, files: Vec<PathBuf>, output: PathBuf) -> BatchOutcome {
        if files.is_empty() {
            return self.finish(
                BatchState::Completed,
                "No files to process".to_string(),
                Vec::new(),
                None,
                None,
            );
        }

        if let Err(e) = validate_inputs(&files, &output) {
            warn!("Rejected batch input: {}", e);
            return self.finish(
                BatchState::Failed,
                format!("Invalid input: {}", e),
                Vec::new(),
                None,
                Some(e.into()),
            );
        }

        self.state = BatchState::Running;
        info!("Batch started");

        let mut run = BatchRun::new(files.len());
        let mut results: Vec<PageResult> = Vec::new();
        let mut cancelled = false;

        for (index, path) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            match self.process_file(path, index, &mut run).await {
                FileOutcome::Completed(pages) => results.extend(pages),
                FileOutcome::Failed => run.failed_files += 1,
                FileOutcome::Cancelled => {
                    cancelled = true;
                    break;
                }
            }

            run.processed_files += 1;
            self.report_percent(&mut run, 0, 0);
        }

        if cancelled {
            let message = format!(
                "Cancelled after {} of {} file(s)",
                run.processed_files, run.total_files
            );
            return self.finish(BatchState::Cancelled, message, results, None, None);
        }

        let merged = dedup::deduplicate(&results);
        let logs = self.log.snapshot();

        match self.exporter.export(&output, &merged, &logs) {
            Ok(path) => {
                let item_count: usize = merged.iter().map(|p| p.items.len()).sum();
                let message = format!(
                    "Processed {} file(s), {} page(s): {} unique item(s), {} file(s) failed",
                    run.processed_files, run.processed_pages, item_count, run.failed_files
                );
                self.finish(BatchState::Completed, message, merged, Some(path), None)
            }
            Err(e) => {
                self.log.error("", 0, format!("Export failed: {}", e));
                self.finish(
                    BatchState::Failed,
                    format!("Export failed: {}", e),
                    merged,
                    None,
                    Some(e.into()),
                )
            }
        }
    }

    async fn process_file(&self, path: &Path, index: usize, run: &mut BatchRun) -> FileOutcome {
        let name = display_name(path);
        let span = info_span!("file", file = %name, index = index + 1, total = run.total_files);
        self.process_file_inner(path, &name, index + 1, run)
            .instrument(span)
            .await
    }

    async fn process_file_inner(
        &self,
        path: &Path,
        name: &str,
        position: usize,
        run: &mut BatchRun,
    ) -> FileOutcome {
        let total = run.total_files;
        self.progress.report(BatchEvent::FileStarted {
            name: name.to_string(),
            index: position,
            total,
        });

        let pages = match self.decoder.decode(path) {
            Ok(pages) => pages,
            Err(e) => {
                self.log.error(name, 0, format!("Failed to decode file: {}", e));
                self.file_finished(name, position, total, FileStatus::Error, Some(e.to_string()));
                return FileOutcome::Failed;
            }
        };

        let page_count = pages.len();
        run.total_pages += page_count;
        let mut file_results = Vec::with_capacity(page_count);

        for (done, page) in pages.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.log.warning(
                    name,
                    0,
                    format!(
                        "Cancelled after {} of {} page(s); results of this file discarded",
                        done, page_count
                    ),
                );
                self.file_finished(name, position, total, FileStatus::Cancelled, None);
                return FileOutcome::Cancelled;
            }

            if let Some(result) = self.extractor.extract(path, page, &self.log).await {
                file_results.push(result);
            }
            run.processed_pages += 1;
            self.report_percent(run, done + 1, page_count);
        }

        self.file_finished(name, position, total, FileStatus::Completed, None);
        FileOutcome::Completed(file_results)
    }

    fn file_finished(
        &self,
        name: &str,
        index: usize,
        total: usize,
        status: FileStatus,
        error: Option<String>,
    ) {
        self.progress.report(BatchEvent::FileFinished {
            name: name.to_string(),
            index,
            total,
            status,
            error,
        });
    }

    fn report_percent(&self, run: &mut BatchRun, pages_done: usize, pages_in_file: usize) {
        let value = run.percent(pages_done, pages_in_file);
        self.progress.report(BatchEvent::ProgressPercent { value });
    }

    fn finish(
        &mut self,
        state: BatchState,
        message: String,
        results: Vec<PageResult>,
        output_path: Option<PathBuf>,
        error: Option<TagscanError>,
    ) -> BatchOutcome {
        self.state = state;

        let summary = RunSummary {
            state,
            success: state == BatchState::Completed,
            message,
            results,
            logs: self.log.snapshot(),
            output_path,
            error: error.as_ref().map(|e| e.to_string()),
        };
        info!(
            state = %state,
            pages = summary.results.len(),
            items = summary.item_count(),
            "{}",
            summary.message
        );

        self.progress.report(BatchEvent::RunCompleted(summary.clone()));

        BatchOutcome {
            state,
            summary,
            error,
        }
    }
}

/// Every input must be an existing regular file; the output target may be
/// missing but not a non-directory.
fn validate_inputs(files: &[PathBuf], output: &Path) -> Result<(), InputError> {
    if output.as_os_str().is_empty() {
        return Err(InputError::EmptyOutputTarget);
    }
    if output.exists() && !output.is_dir() {
        return Err(InputError::OutputNotDirectory(output.to_path_buf()));
    }

    for file in files {
        if !file.exists() {
            return Err(InputError::MissingFile(file.clone()));
        }
        if !file.is_file() {
            return Err(InputError::NotAFile(file.clone()));
        }
    }

    Ok(())
}
