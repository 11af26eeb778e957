use std::path::Path;

use crate::error::DecodeError;
use crate::processor::{DocumentFormat, FormatDecoder, RawPage};

/// Form feed, the page separator of text exports.
const PAGE_BREAK: char = '\x0C';

/// Plain-text exports: always searchable, one page per form feed.
pub struct TextDecoder;

impl TextDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatDecoder for TextDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError> {
        let text = std::fs::read_to_string(path).map_err(|e| DecodeError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(split_pages(&text))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}

fn split_pages(text: &str) -> Vec<RawPage> {
    let mut pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    // a trailing form feed terminates the last page rather than opening a new one
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }

    pages
        .into_iter()
        .zip(1u32..)
        .map(|(page_text, page_number)| RawPage::searchable(page_number, page_text))
        .collect()
}
