use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::classifier::RuleSet;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub process_only_scanned_pages: bool,
    /// Reserved: pages below this confidence are reported, never dropped.
    #[serde(default)]
    pub min_ocr_confidence: f64,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub equipment_keywords: Vec<String>,
    #[serde(default)]
    pub reject_keywords: Vec<String>,
    /// Compiled from `rules` and the keyword lists on first use. Clones share
    /// it, so those fields must not change once it is built.
    #[serde(skip)]
    pub(crate) compiled: OnceLock<Arc<RuleSet>>,
}

impl Config {
    /// The compiled rule set, built on the first call and shared afterwards.
    pub fn rule_set(&self) -> Result<Arc<RuleSet>, ConfigError> {
        if let Some(rules) = self.compiled.get() {
            return Ok(Arc::clone(rules));
        }
        let rules = Arc::new(RuleSet::from_config(self)?);
        Ok(Arc::clone(self.compiled.get_or_init(|| rules)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            process_only_scanned_pages: false,
            min_ocr_confidence: 0.0,
            ocr: OcrConfig::default(),
            rules: Vec::new(),
            equipment_keywords: Vec::new(),
            reject_keywords: Vec::new(),
            compiled: OnceLock::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Confidence assigned when Tesseract returns text without a usable mean
    /// word confidence.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
    #[serde(default)]
    pub policy: OcrPolicy,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

fn default_fallback_confidence() -> f64 {
    50.0
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: default_languages(),
            dpi: default_dpi(),
            fallback_confidence: default_fallback_confidence(),
            policy: OcrPolicy::default(),
        }
    }
}

/// When a page carrying an image payload is sent through OCR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrPolicy {
    /// Searchable pages with usable native text are never OCR'd.
    #[default]
    WhenNoNativeText,
    /// Any page with an image payload is OCR'd, searchable or not.
    WheneverImageAvailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub pattern: String,
}

impl RuleConfig {
    pub fn new(name: &str, tag_type: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            tag_type: tag_type.to_string(),
            pattern: pattern.to_string(),
        }
    }
}
