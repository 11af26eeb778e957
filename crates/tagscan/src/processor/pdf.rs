use std::path::Path;
use std::process::Command;

use crate::error::DecodeError;
use crate::processor::{DocumentFormat, FormatDecoder, RawPage};

/// How PDF pages are rasterised for OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub dpi: u32,
    /// Also rasterise pages whose native text passed the quality check.
    pub searchable_pages: bool,
}

pub struct PdfDecoder {
    render: Option<RenderOptions>,
}

impl PdfDecoder {
    pub fn new(render: Option<RenderOptions>) -> Self {
        Self { render }
    }
}

impl FormatDecoder for PdfDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<RawPage>, DecodeError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let pdf_bytes = std::fs::read(path).map_err(|e| DecodeError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        match lopdf::Document::load_mem(&pdf_bytes) {
            Ok(doc) => Ok(self.decode_document(path, &doc)),
            Err(e) => {
                // poppler copes with more broken files than lopdf does
                let Some(render) = self.render else {
                    return Err(DecodeError::PdfProcessing(format!(
                        "Failed to load PDF: {}. Page rasterisation disabled.",
                        e
                    )));
                };
                tracing::warn!(
                    "lopdf failed to parse {}: {}. Rasterising every page.",
                    path.display(),
                    e
                );
                self.decode_unparsed(path, render)
            }
        }
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

impl PdfDecoder {
    fn decode_document(&self, path: &Path, doc: &lopdf::Document) -> Vec<RawPage> {
        doc.get_pages()
            .into_keys()
            .map(|page_number| {
                let text = doc.extract_text(&[page_number]).unwrap_or_else(|e| {
                    tracing::debug!(page = page_number, "No native text: {}", e);
                    String::new()
                });
                let is_searchable = has_usable_text(&text);

                let image = match self.render {
                    Some(render) if !is_searchable || render.searchable_pages => {
                        render_page(path, page_number, render.dpi)
                    }
                    _ => None,
                };

                RawPage {
                    page_number,
                    is_searchable,
                    raw_text: text,
                    image,
                }
            })
            .collect()
    }

    fn decode_unparsed(
        &self,
        path: &Path,
        render: RenderOptions,
    ) -> Result<Vec<RawPage>, DecodeError> {
        let page_count = count_pdf_pages(path)?;

        Ok((1..=page_count)
            .map(|page_number| {
                RawPage::scanned(page_number, "", render_page(path, page_number, render.dpi))
            })
            .collect())
    }
}

fn render_page(path: &Path, page_number: u32, dpi: u32) -> Option<Vec<u8>> {
    match render_pdf_page_to_image(path, page_number, dpi) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(page = page_number, "Page rasterisation failed: {}", e);
            None
        }
    }
}

/// Marker lopdf emits for CID fonts it cannot map.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// Text at or below this length skips the alphanumeric ratio check.
const MIN_TOTAL_CHARS: usize = 50;

const MIN_ALPHANUMERIC_PERCENT: usize = 10;

/// Native-text quality check deciding whether a page counts as searchable.
///
/// Fails for blank text, text made only of font encoding markers, and long
/// text that is mostly non-alphanumeric.
fn has_usable_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    let cleaned = trimmed
        .replace(IDENTITY_H_PATTERN, "")
        .replace(['\n', ' '], "");
    if cleaned.is_empty() {
        return false;
    }

    let total_chars = trimmed.chars().count();
    let alphanumeric_chars = trimmed.chars().filter(|c| c.is_alphanumeric()).count();

    !(total_chars > MIN_TOTAL_CHARS
        && alphanumeric_chars * 100 < total_chars * MIN_ALPHANUMERIC_PERCENT)
}

/// Page count via pdfinfo (poppler-utils), for files lopdf rejects.
fn count_pdf_pages(path: &Path) -> Result<u32, DecodeError> {
    let output = Command::new("pdfinfo").arg(path).output().map_err(|e| {
        DecodeError::PdfProcessing(format!(
            "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
            e
        ))
    })?;

    if !output.status.success() {
        return Err(DecodeError::PdfProcessing(format!(
            "pdfinfo failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    parse_page_count(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        DecodeError::PdfProcessing("pdfinfo did not report a page count".to_string())
    })
}

fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse().ok())
}

fn render_pdf_page_to_image(
    path: &Path,
    page_number: u32,
    dpi: u32,
) -> Result<Vec<u8>, DecodeError> {
    let output_prefix =
        std::env::temp_dir().join(format!("tagscan_page_{}", uuid::Uuid::new_v4()));
    let page = page_number.to_string();

    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-f", &page, "-l", &page])
        .arg(path)
        .arg(&output_prefix)
        .output()
        .map_err(|e| {
            DecodeError::PdfProcessing(format!(
                "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                e
            ))
        })?;

    if !output.status.success() {
        return Err(DecodeError::PdfProcessing(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    // pdftoppm zero-pads the page suffix to the width of the page count
    let prefix = output_prefix.display();
    let candidates = [
        format!("{}-{}.png", prefix, page_number),
        format!("{}-{:02}.png", prefix, page_number),
        format!("{}-{:03}.png", prefix, page_number),
        format!("{}-{:04}.png", prefix, page_number),
    ];
    let image_path = candidates
        .iter()
        .find(|p| Path::new(p).exists())
        .ok_or_else(|| {
            DecodeError::PdfProcessing("Failed to find rendered page image".to_string())
        })?;

    let image_data = std::fs::read(image_path).map_err(|e| {
        DecodeError::PdfProcessing(format!("Failed to read rendered image: {}", e))
    })?;
    let _ = std::fs::remove_file(image_path);

    Ok(image_data)
}
