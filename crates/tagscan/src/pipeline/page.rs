use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info_span, Instrument};

use crate::broadcast::log_sink::LogSink;
use crate::classifier::{ClassifiedItem, Classifier};
use crate::config::schema::OcrPolicy;
use crate::processor::ocr::{OcrEngine, OcrOutput};
use crate::processor::{display_name, RawPage};

use super::config::BatchConfig;

/// Classified output of one page, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub source_path: PathBuf,
    pub source_file: String,
    pub page_number: u32,
    pub is_searchable: bool,
    /// Native or OCR text the items were classified from.
    pub text: String,
    /// Page-level OCR confidence in `[0, 100]`; 0 for native text.
    pub confidence: f64,
    pub items: Vec<ClassifiedItem>,
}

impl PageResult {
    /// Same provenance, different items.
    pub fn with_items(&self, items: Vec<ClassifiedItem>) -> Self {
        Self {
            items,
            ..self.clone()
        }
    }
}

/// Per-page glue between decoding, OCR and classification.
pub struct PageExtractor {
    classifier: Arc<Classifier>,
    ocr: Arc<dyn OcrEngine>,
    process_only_scanned_pages: bool,
    min_ocr_confidence: f64,
    ocr_policy: OcrPolicy,
}

impl PageExtractor {
    pub fn new(
        classifier: Arc<Classifier>,
        ocr: Arc<dyn OcrEngine>,
        config: &BatchConfig,
    ) -> Self {
        Self {
            classifier,
            ocr,
            process_only_scanned_pages: config.process_only_scanned_pages,
            min_ocr_confidence: config.min_ocr_confidence,
            ocr_policy: config.ocr_policy,
        }
    }

    /// `None` when the page is skipped by policy.
    ///
    /// OCR runs on the blocking pool and is awaited before returning; it is
    /// the only suspension point of a page.
    pub async fn extract(
        &self,
        source: &Path,
        page: RawPage,
        log: &LogSink,
    ) -> Option<PageResult> {
        let file_name = display_name(source);
        let page_number = page.page_number;

        self.extract_inner(source, &file_name, page, log)
            .instrument(info_span!("page", file = %file_name, page = page_number))
            .await
    }

    async fn extract_inner(
        &self,
        source: &Path,
        file_name: &str,
        page: RawPage,
        log: &LogSink,
    ) -> Option<PageResult> {
        let page_number = page.page_number;

        if self.process_only_scanned_pages && page.is_searchable {
            log.skipped(file_name, page_number, "Searchable page skipped");
            return None;
        }

        let started = Instant::now();
        let is_searchable = page.is_searchable;
        let use_ocr = match self.ocr_policy {
            OcrPolicy::WhenNoNativeText => !is_searchable,
            OcrPolicy::WheneverImageAvailable => true,
        };

        tracing::debug!(
            searchable = is_searchable,
            native_chars = page.text_length(),
            has_image = page.image.is_some(),
            ocr = use_ocr,
            "Page decoded"
        );

        let (text, confidence) = match page.image {
            Some(image) if use_ocr => {
                let output = self.recognize(image, file_name, page_number, log).await;
                (output.text, output.confidence)
            }
            _ => (page.raw_text, 0.0),
        };

        let items = self.classifier.classify(&text, confidence / 100.0);

        log.success(
            file_name,
            page_number,
            format!(
                "{} item(s) found on {} page in {} ms",
                items.len(),
                if is_searchable { "searchable" } else { "scanned" },
                started.elapsed().as_millis()
            ),
        );

        Some(PageResult {
            source_path: source.to_path_buf(),
            source_file: file_name.to_string(),
            page_number,
            is_searchable,
            text,
            confidence,
            items,
        })
    }

    async fn recognize(
        &self,
        image: Vec<u8>,
        file_name: &str,
        page_number: u32,
        log: &LogSink,
    ) -> OcrOutput {
        let ocr = Arc::clone(&self.ocr);
        let output = match tokio::task::spawn_blocking(move || ocr.recognize(&image)).await {
            Ok(output) => output,
            Err(e) => {
                log.warning(file_name, page_number, format!("OCR task failed: {}", e));
                return OcrOutput::empty();
            }
        };

        if output.text.trim().is_empty() {
            log.warning(file_name, page_number, "OCR produced no text");
        } else if output.confidence < self.min_ocr_confidence {
            log.debug(
                file_name,
                page_number,
                format!(
                    "OCR confidence {:.1} below minimum {:.1}",
                    output.confidence, self.min_ocr_confidence
                ),
            );
        }

        output
    }
}
