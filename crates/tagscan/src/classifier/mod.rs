//! Rule engine turning raw page text into typed candidate identifiers.

pub mod heuristics;
pub mod rules;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ConfigError;

use self::heuristics::{
    char_len, discard_chunk, has_digit, is_noise_word, is_pure_number, looks_like_phrase,
    normalize, reject_line, split_chunks, split_lines, MAX_EQUIPMENT_CHARS, MIN_VALUE_CHARS,
};
pub use self::rules::{CompiledRule, RuleSet};

/// A classified candidate. `confidence` is in `0..=1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedItem {
    Tag {
        #[serde(rename = "type")]
        tag_type: String,
        value: String,
        confidence: f64,
    },
    Equipment {
        value: String,
        confidence: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Tag,
    Equipment,
}

/// Batch-wide identity: Tags by (type, value), Equipment by value, values
/// compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Tag { tag_type: String, value: String },
    Equipment { value: String },
}

impl ClassifiedItem {
    pub fn tag(tag_type: &str, value: &str, confidence: f64) -> Self {
        Self::Tag {
            tag_type: tag_type.to_string(),
            value: value.to_string(),
            confidence,
        }
    }

    pub fn equipment(value: &str, confidence: f64) -> Self {
        Self::Equipment {
            value: value.to_string(),
            confidence,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Tag { .. } => ItemKind::Tag,
            Self::Equipment { .. } => ItemKind::Equipment,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Tag { value, .. } | Self::Equipment { value, .. } => value,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Tag { confidence, .. } | Self::Equipment { confidence, .. } => *confidence,
        }
    }

    pub fn key(&self) -> ItemKey {
        match self {
            Self::Tag {
                tag_type, value, ..
            } => ItemKey::Tag {
                tag_type: tag_type.clone(),
                value: value.to_lowercase(),
            },
            Self::Equipment { value, .. } => ItemKey::Equipment {
                value: value.to_lowercase(),
            },
        }
    }
}

pub struct Classifier {
    rules: Arc<RuleSet>,
}

impl Classifier {
    pub fn new(rules: impl Into<Arc<RuleSet>>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// Reuses the rule set compiled when the config was loaded.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.rule_set()?))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classifies one page of text. Every emitted item carries `confidence`.
    pub fn classify(&self, text: &str, confidence: f64) -> Vec<ClassifiedItem> {
        let mut collector = ItemCollector::new(confidence);

        for raw_line in split_lines(text) {
            let line = normalize(raw_line);
            if let Some(reason) = reject_line(&line, |l| self.rules.has_reject_keyword(l)) {
                tracing::trace!(?reason, line = %line, "Line rejected");
                continue;
            }

            for chunk in split_chunks(raw_line) {
                self.classify_chunk(chunk, &mut collector);
            }
        }

        collector.into_items()
    }

    /// Full match wins outright. A partial match emits the matched text and the
    /// rest of the chunk is classified again, so one chunk can yield several
    /// tags followed by an equipment description. The rest is the text on both
    /// sides of the match joined by a space.
    ///
    /// A pass that leaves the chunk unchanged ends the loop.
    fn classify_chunk(&self, chunk: String, out: &mut ItemCollector) {
        let mut remaining = chunk;

        loop {
            if discard_chunk(&remaining) {
                return;
            }

            if let Some(rule) = self.rules.full_match(&remaining) {
                out.push_tag(&rule.tag_type, &remaining);
                return;
            }

            match self.rules.partial_match(&remaining) {
                Some((rule, range)) => {
                    out.push_tag(&rule.tag_type, &remaining[range.clone()]);
                    let rest = format!("{} {}", &remaining[..range.start], &remaining[range.end..]);
                    let rest = normalize(&rest);
                    if rest == remaining {
                        return;
                    }
                    remaining = rest;
                }
                None => {
                    if self.is_equipment(&remaining) {
                        out.push_equipment(&remaining);
                    }
                    return;
                }
            }
        }
    }

    fn is_equipment(&self, chunk: &str) -> bool {
        char_len(chunk) <= MAX_EQUIPMENT_CHARS
            && has_digit(chunk)
            && !is_pure_number(chunk)
            && !looks_like_phrase(chunk)
            && self.rules.has_equipment_keyword(chunk)
    }
}

/// Page-local accumulator enforcing one item per (variant, lowercase value).
struct ItemCollector {
    confidence: f64,
    seen: HashSet<(ItemKind, String)>,
    items: Vec<ClassifiedItem>,
}

impl ItemCollector {
    fn new(confidence: f64) -> Self {
        Self {
            confidence,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn push_tag(&mut self, tag_type: &str, value: &str) {
        let item = ClassifiedItem::tag(tag_type, &normalize(value), self.confidence);
        self.push(item);
    }

    fn push_equipment(&mut self, value: &str) {
        let item = ClassifiedItem::equipment(&normalize(value), self.confidence);
        self.push(item);
    }

    fn push(&mut self, item: ClassifiedItem) {
        let value = item.value();
        if char_len(value) < MIN_VALUE_CHARS || is_noise_word(value) {
            return;
        }
        if self.seen.insert((item.kind(), value.to_lowercase())) {
            self.items.push(item);
        }
    }

    fn into_items(self) -> Vec<ClassifiedItem> {
        self.items
    }
}
