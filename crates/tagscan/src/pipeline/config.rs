use crate::config::schema::OcrPolicy;
use crate::config::Config;

/// Run-level settings taken from the loaded configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub process_only_scanned_pages: bool,
    /// Pages below this OCR confidence get a debug log entry.
    pub min_ocr_confidence: f64,
    pub ocr_policy: OcrPolicy,
    /// Capacity of the log sink's observer channel.
    pub log_capacity: usize,
}

impl BatchConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            process_only_scanned_pages: config.process_only_scanned_pages,
            min_ocr_confidence: config.min_ocr_confidence,
            ocr_policy: config.ocr.policy,
            ..Self::default()
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            process_only_scanned_pages: false,
            min_ocr_confidence: 0.0,
            ocr_policy: OcrPolicy::default(),
            log_capacity: 1000,
        }
    }
}
