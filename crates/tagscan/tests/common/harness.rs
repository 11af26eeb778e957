//! Test harness for isolated batch runs.
//!
//! Input files are created empty in a temp directory so they pass input
//! validation; their pages come from the fake decoder.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use tagscan::config::schema::Config;
use tagscan::{
    BatchConfig, BatchCoordinator, BatchOutcome, Classifier, DocumentDecoder, Exporter,
    OcrEngine, ProgressReporter,
};

use super::fakes::{FakeOcr, RecordingExporter, RecordingProgress};

pub struct TestHarness {
    pub temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        Self {
            temp_dir,
            input_dir,
            output_dir,
        }
    }

    /// Creates the named files (empty) and returns their paths in order.
    pub fn input_files(&self, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = self.input_dir.join(name);
                std::fs::write(&path, b"").expect("Failed to create input file");
                path
            })
            .collect()
    }

    pub fn write_input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.input_dir.join(name);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    pub fn coordinator(
        &self,
        config: &Config,
        decoder: impl DocumentDecoder + 'static,
        ocr: impl OcrEngine + 'static,
        exporter: Arc<dyn Exporter>,
        progress: Arc<dyn ProgressReporter>,
    ) -> BatchCoordinator {
        let classifier = Classifier::from_config(config).expect("test config is valid");
        BatchCoordinator::new(
            &BatchConfig::from_config(config),
            Arc::new(classifier),
            Arc::new(decoder),
            Arc::new(ocr),
            exporter,
            progress,
        )
    }

    /// Runs `names` through a coordinator without OCR and returns the outcome
    /// together with the recorders.
    pub async fn run(
        &self,
        config: &Config,
        decoder: impl DocumentDecoder + 'static,
        names: &[&str],
    ) -> (BatchOutcome, Arc<RecordingExporter>, Arc<RecordingProgress>) {
        let exporter = RecordingExporter::new();
        let progress = RecordingProgress::new();
        let coordinator = self.coordinator(
            config,
            decoder,
            FakeOcr::new(),
            exporter.clone(),
            progress.clone(),
        );

        let outcome = coordinator
            .start(self.input_files(names), self.output_dir.clone())
            .await;
        (outcome, exporter, progress)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
