//! In-memory collaborators for driving the batch coordinator.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tagscan::processor::display_name;
use tagscan::{
    BatchEvent, CancelHandle, DecodeError, DocumentDecoder, ExportError, Exporter, LogEntry,
    OcrEngine, OcrOutput, PageResult, ProgressReporter, RawPage,
};

/// Decodes by file name; unknown or broken files fail.
#[derive(Default)]
pub struct FakeDecoder {
    documents: HashMap<String, Option<Vec<RawPage>>>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(mut self, name: &str, pages: Vec<RawPage>) -> Self {
        self.documents.insert(name.to_string(), Some(pages));
        self
    }

    /// One searchable page per text.
    pub fn text_document(self, name: &str, pages: &[&str]) -> Self {
        let pages = pages
            .iter()
            .zip(1u32..)
            .map(|(text, number)| RawPage::searchable(number, *text))
            .collect();
        self.document(name, pages)
    }

    pub fn broken(mut self, name: &str) -> Self {
        self.documents.insert(name.to_string(), None);
        self
    }
}

impl DocumentDecoder for FakeDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError> {
        match self.documents.get(&display_name(path)) {
            Some(Some(pages)) => Ok(pages.clone()),
            Some(None) => Err(DecodeError::PdfProcessing("corrupt cross-reference table".into())),
            None => Err(DecodeError::UnsupportedFormat(display_name(path))),
        }
    }
}

/// Maps image payloads to fixed OCR outputs; unknown images yield nothing.
#[derive(Default)]
pub struct FakeOcr {
    outputs: HashMap<Vec<u8>, OcrOutput>,
}

impl FakeOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(mut self, image: &[u8], text: &str, confidence: f64) -> Self {
        self.outputs
            .insert(image.to_vec(), OcrOutput::new(text, confidence));
        self
    }
}

impl OcrEngine for FakeOcr {
    fn recognize(&self, image: &[u8]) -> OcrOutput {
        self.outputs.get(image).cloned().unwrap_or_else(OcrOutput::empty)
    }
}

/// One captured `Exporter::export` call.
#[derive(Debug, Clone)]
pub struct ExportCall {
    pub output_dir: PathBuf,
    pub results: Vec<PageResult>,
    pub logs: Vec<LogEntry>,
}

#[derive(Default)]
pub struct RecordingExporter {
    calls: Mutex<Vec<ExportCall>>,
    fail: bool,
}

impl RecordingExporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<ExportCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Exporter for RecordingExporter {
    fn export(
        &self,
        output_dir: &Path,
        results: &[PageResult],
        logs: &[LogEntry],
    ) -> Result<PathBuf, ExportError> {
        self.calls.lock().unwrap().push(ExportCall {
            output_dir: output_dir.to_path_buf(),
            results: results.to_vec(),
            logs: logs.to_vec(),
        });

        let path = output_dir.join("tag_index.sqlite");
        if self.fail {
            Err(ExportError::FileExists(path))
        } else {
            Ok(path)
        }
    }
}

type CancelTrigger = Box<dyn Fn(&BatchEvent) -> bool + Send + Sync>;

/// Records every event. Optionally cancels the run the first time an event
/// matches a trigger, once armed with the coordinator's handle.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<BatchEvent>>,
    cancel: OnceLock<CancelHandle>,
    trigger: Option<CancelTrigger>,
}

impl RecordingProgress {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cancelling_when(
        trigger: impl Fn(&BatchEvent) -> bool + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            trigger: Some(Box::new(trigger)),
            ..Self::default()
        })
    }

    pub fn arm(&self, handle: CancelHandle) {
        let _ = self.cancel.set(handle);
    }

    pub fn events(&self) -> Vec<BatchEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BatchEvent::ProgressPercent { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn started_files(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BatchEvent::FileStarted { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn run_completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, BatchEvent::RunCompleted(_)))
            .count()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: BatchEvent) {
        if let (Some(trigger), Some(cancel)) = (&self.trigger, self.cancel.get()) {
            if trigger(&event) {
                cancel.cancel();
            }
        }
        self.events.lock().unwrap().push(event);
    }
}

pub fn started(event: &BatchEvent, file: &str) -> bool {
    matches!(event, BatchEvent::FileStarted { name, .. } if name == file)
}

pub fn finished(event: &BatchEvent, file: &str) -> bool {
    matches!(event, BatchEvent::FileFinished { name, .. } if name == file)
}
