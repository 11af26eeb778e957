pub mod image;
pub mod ocr;
pub mod pdf;
pub mod text;

use std::path::Path;

use crate::config::schema::{OcrConfig, OcrPolicy};
use crate::error::DecodeError;

pub use pdf::RenderOptions;

/// One decoded page, as handed to page extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    /// 1-based.
    pub page_number: u32,
    pub is_searchable: bool,
    pub raw_text: String,
    pub image: Option<Vec<u8>>,
}

impl RawPage {
    pub fn searchable(page_number: u32, raw_text: impl Into<String>) -> Self {
        Self {
            page_number,
            is_searchable: true,
            raw_text: raw_text.into(),
            image: None,
        }
    }

    pub fn scanned(page_number: u32, raw_text: impl Into<String>, image: Option<Vec<u8>>) -> Self {
        Self {
            page_number,
            is_searchable: false,
            raw_text: raw_text.into(),
            image,
        }
    }

    pub fn text_length(&self) -> usize {
        self.raw_text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Image,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => Some(Self::Image),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Document decoding collaborator: file -> ordered pages.
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError>;
}

/// A decoder for one document format.
pub trait FormatDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

/// Routes a file to the decoder registered for its extension.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn FormatDecoder>>,
}

impl DecoderRegistry {
    /// `render` of `None` disables rasterising PDF pages.
    pub fn new(render: Option<RenderOptions>) -> Self {
        let decoders: Vec<Box<dyn FormatDecoder>> = vec![
            Box::new(text::TextDecoder::new()),
            Box::new(image::ImageDecoder::new()),
            Box::new(pdf::PdfDecoder::new(render)),
        ];

        Self { decoders }
    }

    pub fn from_config(ocr: &OcrConfig) -> Self {
        let render = ocr.enabled.then_some(RenderOptions {
            dpi: ocr.dpi,
            searchable_pages: ocr.policy == OcrPolicy::WheneverImageAvailable,
        });
        Self::new(render)
    }
}

impl DocumentDecoder for DecoderRegistry {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| DecodeError::UnsupportedFormat(extension.to_string()))?;

        for decoder in &self.decoders {
            if decoder.supports(format) {
                let pages = decoder.decode(path)?;
                if pages.is_empty() {
                    return Err(DecodeError::Empty(path.to_path_buf()));
                }
                return Ok(pages);
            }
        }

        Err(DecodeError::UnsupportedFormat(extension.to_string()))
    }
}

/// File name component of a path, for log entries and events.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
