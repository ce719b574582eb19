//! Per-page choice between the native text layer and OCR.

use tracing::{debug, warn};

use crate::error::LoandocError;
use crate::models::document::{ExtractedPage, PageSource};
use crate::ocr::OcrEngine;
use crate::pdf::PdfProcessor;

/// Default minimum trimmed native text length, in characters.
pub const DEFAULT_MIN_TEXT_LENGTH: usize = 50;

/// Default rendering resolution for OCR.
pub const DEFAULT_RENDER_DPI: u32 = 300;

/// Whether native text is too short to trust and the page needs OCR.
pub fn needs_ocr(native_text: &str, min_text_length: usize) -> bool {
    native_text.trim().chars().count() < min_text_length
}

/// Pick the text for a page.
///
/// Native text of at least `min_text_length` trimmed characters wins and
/// `ocr` is never called. Otherwise the OCR output replaces the native text
/// entirely. Returns `None` when the winning text is empty after trimming.
pub fn select_page_text<F, E>(
    native_text: &str,
    min_text_length: usize,
    ocr: F,
) -> Result<Option<(String, PageSource)>, E>
where
    F: FnOnce() -> Result<String, E>,
{
    let (text, source) = if needs_ocr(native_text, min_text_length) {
        (ocr()?, PageSource::Ocr)
    } else {
        (native_text.to_string(), PageSource::Native)
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some((trimmed.to_string(), source)))
}

/// Produces the text of one PDF page.
#[derive(Debug, Clone)]
pub struct PageTextExtractor {
    min_text_length: usize,
    render_dpi: u32,
}

impl PageTextExtractor {
    pub fn new() -> Self {
        Self {
            min_text_length: DEFAULT_MIN_TEXT_LENGTH,
            render_dpi: DEFAULT_RENDER_DPI,
        }
    }

    /// Set the native text threshold below which a page goes to OCR.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Set the resolution pages are rendered at for OCR.
    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    /// Extract a page, or `None` if it contributes no text.
    ///
    /// Render and OCR failures propagate; no partial text is produced for
    /// the page.
    pub fn extract<P, O>(
        &self,
        pdf: &P,
        page: u32,
        ocr: &O,
    ) -> Result<Option<ExtractedPage>, LoandocError>
    where
        P: PdfProcessor + ?Sized,
        O: OcrEngine + ?Sized,
    {
        // An unreadable text layer is indistinguishable from a scan.
        let native = pdf.extract_page_text(page).unwrap_or_else(|e| {
            warn!("No native text for page {}: {}", page, e);
            String::new()
        });

        let selected = select_page_text(&native, self.min_text_length, || {
            debug!(
                "Page {} has {} native chars, running OCR",
                page,
                native.trim().chars().count()
            );
            let image = pdf.render_page(page, self.render_dpi)?;
            let text = ocr.recognize(&image)?;
            Ok::<_, LoandocError>(text)
        })?;

        Ok(selected.map(|(content, source)| ExtractedPage {
            page_number: page,
            content,
            source,
        }))
    }
}

impl Default for PageTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const LONG_TEXT: &str = "This loan agreement is made between the lender and borrower.";

    #[test]
    fn test_needs_ocr_threshold() {
        assert!(needs_ocr("", 50));
        assert!(needs_ocr(&"x".repeat(49), 50));
        assert!(!needs_ocr(&"x".repeat(50), 50));
        // Surrounding whitespace does not count
        assert!(needs_ocr(&format!("   {}   \n", "x".repeat(49)), 50));
        // Characters, not bytes
        assert!(needs_ocr(&"ł".repeat(30), 50));
    }

    #[test]
    fn test_long_native_text_never_calls_ocr() {
        let called = Cell::new(false);
        let result = select_page_text::<_, ()>(&format!("  {}  ", LONG_TEXT), 50, || {
            called.set(true);
            Ok("ocr".to_string())
        })
        .unwrap();

        assert!(!called.get());
        assert_eq!(result, Some((LONG_TEXT.to_string(), PageSource::Native)));
    }

    #[test]
    fn test_short_native_text_is_replaced_by_ocr() {
        let result =
            select_page_text::<_, ()>("Page 1", 50, || Ok("\n Scanned text \n".to_string()))
                .unwrap();
        assert_eq!(result, Some(("Scanned text".to_string(), PageSource::Ocr)));
    }

    #[test]
    fn test_empty_ocr_output_omits_page() {
        // Short native text is discarded even when OCR finds nothing
        let result = select_page_text::<_, ()>("Page 1", 50, || Ok("  ".to_string())).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_ocr_error_propagates() {
        let result = select_page_text("", 50, || Err("engine crashed"));
        assert_eq!(result, Err("engine crashed"));
    }
}
