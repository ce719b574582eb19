//! Whole-document text extraction.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::error::LoandocError;
use crate::models::config::PdfConfig;
use crate::models::document::DocumentExtractionResult;
use crate::ocr::OcrEngine;
use crate::pdf::{validate_upload, PdfExtractor, PdfProcessor};

use super::page::PageTextExtractor;

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Turns PDF bytes into per-page text, falling back to OCR where the text
/// layer is missing or too short.
pub struct DocumentExtractionPipeline<O> {
    ocr: O,
    pages: PageTextExtractor,
    max_pages: usize,
    max_file_size: usize,
}

impl<O: OcrEngine> DocumentExtractionPipeline<O> {
    /// Create a pipeline with default thresholds.
    pub fn new(ocr: O) -> Self {
        Self {
            ocr,
            pages: PageTextExtractor::new(),
            max_pages: 0,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Create a pipeline from the `pdf` configuration section.
    pub fn from_config(ocr: O, config: &PdfConfig) -> Self {
        Self {
            ocr,
            pages: PageTextExtractor::new()
                .with_min_text_length(config.min_text_length)
                .with_render_dpi(config.render_dpi),
            max_pages: config.max_pages,
            max_file_size: config.max_file_size,
        }
    }

    /// Set the native text threshold below which a page goes to OCR.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.pages = self.pages.with_min_text_length(min_text_length);
        self
    }

    /// Only process the first `max_pages` pages (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the upload size limit in bytes.
    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Extract text and metadata from PDF bytes.
    ///
    /// Never fails: any error is reported as a failure result with empty
    /// pages and metadata.
    pub fn extract(&self, data: &[u8]) -> DocumentExtractionResult {
        let result = validate_upload(data, self.max_file_size)
            .map_err(LoandocError::from)
            .and_then(|()| {
                let mut pdf = PdfExtractor::new();
                pdf.load(data)?;
                Ok(pdf)
            });

        match result {
            Ok(pdf) => self.extract_loaded(&pdf),
            Err(e) => {
                error!("Error extracting text from PDF: {}", e);
                DocumentExtractionResult::failure(e.to_string())
            }
        }
    }

    /// Extract text and metadata from an already loaded document.
    pub fn extract_loaded<P: PdfProcessor + ?Sized>(&self, pdf: &P) -> DocumentExtractionResult {
        match self.try_extract_loaded(pdf) {
            Ok(result) => result,
            Err(e) => {
                error!("Error extracting text from PDF: {}", e);
                DocumentExtractionResult::failure(e.to_string())
            }
        }
    }

    fn try_extract_loaded<P: PdfProcessor + ?Sized>(
        &self,
        pdf: &P,
    ) -> Result<DocumentExtractionResult, LoandocError> {
        let start = Instant::now();
        let metadata = pdf.metadata();
        let total = pdf.page_count();

        let limit = if self.max_pages > 0 {
            total.min(u32::try_from(self.max_pages).unwrap_or(u32::MAX))
        } else {
            total
        };
        if limit < total {
            warn!("Processing only the first {} of {} pages", limit, total);
        }

        let mut pages = Vec::new();
        for page in 1..=limit {
            if let Some(extracted) = self.pages.extract(pdf, page, &self.ocr)? {
                pages.push(extracted);
            }
        }

        info!(
            "Extracted {} of {} pages in {}ms",
            pages.len(),
            total,
            start.elapsed().as_millis()
        );

        Ok(DocumentExtractionResult::success(pages, metadata))
    }
}
