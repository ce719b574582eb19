//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use crate::models::document::DocumentMetadata;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Read the document information dictionary.
    fn metadata(&self) -> DocumentMetadata;

    /// Extract the embedded text layer of a page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Render a page as an image at the specified DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}

/// Check uploaded bytes before parsing: PDF signature and size limit.
pub fn validate_upload(data: &[u8], max_size: usize) -> Result<()> {
    if data.len() > max_size {
        return Err(PdfError::TooLarge {
            size: data.len(),
            limit: max_size,
        });
    }

    // The header may be preceded by junk; readers accept it within the first KiB.
    let head = &data[..data.len().min(1024)];
    if !head.windows(5).any(|w| w == b"%PDF-") {
        return Err(PdfError::NotPdf);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload(b"%PDF-1.7\n%...", 1024).is_ok());
        assert!(validate_upload(b"\n\n%PDF-1.4 body", 1024).is_ok());

        assert!(matches!(
            validate_upload(b"PK\x03\x04 zip archive", 1024),
            Err(PdfError::NotPdf)
        ));
        assert!(matches!(validate_upload(b"", 1024), Err(PdfError::NotPdf)));
        assert!(matches!(
            validate_upload(b"%PDF-1.7 too big", 4),
            Err(PdfError::TooLarge { size: 16, limit: 4 })
        ));
    }
}
