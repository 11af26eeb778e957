use std::path::Path;

use image::GenericImageView;

use crate::error::DecodeError;
use crate::processor::{DocumentFormat, FormatDecoder, RawPage};

/// Raster drawings: a single non-searchable page carrying the file bytes.
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatDecoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError> {
        let _span = tracing::info_span!("processor.image").entered();

        let image_data = std::fs::read(path).map_err(|e| DecodeError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let img = image::load_from_memory(&image_data)
            .map_err(|e| DecodeError::ImageProcessing(format!("Failed to load image: {}", e)))?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::ImageProcessing(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }
        tracing::debug!(width, height, "Decoded raster page");

        Ok(vec![RawPage::scanned(1, "", Some(image_data))])
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Image)
    }
}
