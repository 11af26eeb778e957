//! Builders for classifier rule sets and configurations.

#![allow(dead_code)]

use tagscan::config::schema::{Config, OcrConfig, RuleConfig};
use tagscan::Classifier;

pub const EC_TAG_PATTERN: &str = r"EC-[A-Z0-9]{2,15}-\d{6}";
pub const ES_TAG_PATTERN: &str = r"ES-[A-Z]{3}-\d{6}";

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    process_only_scanned_pages: bool,
    min_ocr_confidence: f64,
    ocr: OcrConfig,
    rules: Vec<RuleConfig>,
    equipment_keywords: Vec<String>,
    reject_keywords: Vec<String>,
}

impl ConfigBuilder {
    /// OCR disabled, no rules, no keywords.
    pub fn new() -> Self {
        Self {
            process_only_scanned_pages: false,
            min_ocr_confidence: 0.0,
            ocr: OcrConfig {
                enabled: false,
                ..OcrConfig::default()
            },
            rules: vec![],
            equipment_keywords: vec![],
            reject_keywords: vec![],
        }
    }

    /// The drawing rule set used across the integration tests.
    pub fn drawings() -> Self {
        Self::new()
            .rule("EC_TAG", "TAG", EC_TAG_PATTERN)
            .rule("ES_TAG", "TAG", ES_TAG_PATTERN)
            .equipment_keyword("MOTOR")
            .equipment_keyword("PUMP")
            .reject_keyword("COPYRIGHT")
    }

    pub fn rule(mut self, name: &str, tag_type: &str, pattern: &str) -> Self {
        self.rules.push(RuleConfig::new(name, tag_type, pattern));
        self
    }

    pub fn equipment_keyword(mut self, keyword: &str) -> Self {
        self.equipment_keywords.push(keyword.to_string());
        self
    }

    pub fn reject_keyword(mut self, keyword: &str) -> Self {
        self.reject_keywords.push(keyword.to_string());
        self
    }

    pub fn process_only_scanned_pages(mut self, enabled: bool) -> Self {
        self.process_only_scanned_pages = enabled;
        self
    }

    pub fn min_ocr_confidence(mut self, confidence: f64) -> Self {
        self.min_ocr_confidence = confidence;
        self
    }

    pub fn build(self) -> Config {
        let mut config = Config::default();
        config.process_only_scanned_pages = self.process_only_scanned_pages;
        config.min_ocr_confidence = self.min_ocr_confidence;
        config.ocr = self.ocr;
        config.rules = self.rules;
        config.equipment_keywords = self.equipment_keywords;
        config.reject_keywords = self.reject_keywords;
        config
    }

    pub fn classifier(self) -> Classifier {
        let config = self.build();
        Classifier::from_config(&config).expect("test rules compile")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
