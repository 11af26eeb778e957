use std::io::Cursor;
use std::sync::Arc;

use crate::config::schema::OcrConfig;
use crate::error::OcrError;

/// Recognised text with a confidence in `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub confidence: f64,
}

impl OcrOutput {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }
}

/// OCR collaborator. Infallible by contract: engines report failure as
/// [`OcrOutput::empty`].
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> OcrOutput;
}

impl<T: OcrEngine + ?Sized> OcrEngine for Arc<T> {
    fn recognize(&self, image: &[u8]) -> OcrOutput {
        (**self).recognize(image)
    }
}

/// Tesseract through leptess. A fresh engine is initialised per image.
#[derive(Clone)]
pub struct TesseractOcr {
    inner: Arc<TesseractOcrInner>,
}

struct TesseractOcrInner {
    languages: String,
    dpi: u32,
    fallback_confidence: f64,
}

impl TesseractOcr {
    pub fn new(languages: &[String], dpi: u32, fallback_confidence: f64) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(TesseractOcrInner {
                languages: lang_str,
                dpi,
                fallback_confidence,
            }),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(&config.languages, config.dpi, config.fallback_confidence)
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }

    fn try_recognize(&self, image_data: &[u8]) -> Result<OcrOutput, OcrError> {
        let img = image::load_from_memory(image_data)
            .map_err(|e| OcrError::LoadImage(e.to_string()))?;

        // leptess reads PNG reliably regardless of the source encoding
        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| OcrError::ConvertImage(e.to_string()))?;

        let mut lt = leptess::LepTess::new(None, &self.inner.languages)
            .map_err(|e| OcrError::Init(e.to_string()))?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| OcrError::Recognition(format!("Failed to set image: {}", e)))?;
        lt.set_source_resolution(self.inner.dpi as i32);

        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        let confidence =
            page_confidence(&text, lt.mean_text_conf(), self.inner.fallback_confidence);
        Ok(OcrOutput::new(text, confidence))
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> OcrOutput {
        let _span = tracing::info_span!("processor.ocr").entered();

        match self.try_recognize(image) {
            Ok(output) => {
                tracing::debug!(confidence = output.confidence, "OCR finished");
                output
            }
            Err(e) => {
                tracing::warn!("OCR failed: {}", e);
                OcrOutput::empty()
            }
        }
    }
}

/// Blank text has no confidence; text without a usable mean word confidence
/// gets the configured fallback.
fn page_confidence(text: &str, mean_text_conf: i32, fallback: f64) -> f64 {
    if text.trim().is_empty() {
        0.0
    } else if mean_text_conf <= 0 {
        fallback
    } else {
        f64::from(mean_text_conf)
    }
}
