//! Per-document extraction results.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which path produced a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    /// Embedded PDF text layer.
    Native,
    /// OCR over the rendered page image.
    Ocr,
}

/// Text of a single non-empty page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// Page number (1-indexed).
    pub page_number: u32,

    /// Trimmed page text, never empty.
    pub content: String,

    /// Path that produced the text.
    pub source: PageSource,
}

/// Document information dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    /// Raw PDF date string, e.g. `D:20240115093000+01'00'`.
    pub creation_date: String,
    pub total_pages: u32,
}

impl DocumentMetadata {
    /// Parsed creation date, if the raw string is a PDF date.
    pub fn created(&self) -> Option<NaiveDateTime> {
        parse_pdf_date(&self.creation_date)
    }
}

/// Outcome of a document extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Success,
    Failure,
}

/// Result of running the extraction pipeline over one document.
///
/// Extraction is all-or-nothing: a failed result never carries pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtractionResult {
    /// Non-empty pages in document order.
    pub pages: Vec<ExtractedPage>,

    /// Document metadata (empty on failure).
    pub metadata: DocumentMetadata,

    /// Whether extraction succeeded.
    pub status: DocumentStatus,

    /// Error message when extraction failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DocumentExtractionResult {
    /// Create a successful result.
    pub fn success(pages: Vec<ExtractedPage>, metadata: DocumentMetadata) -> Self {
        Self {
            pages,
            metadata,
            status: DocumentStatus::Success,
            error_message: None,
        }
    }

    /// Create a failed result, discarding any partial output.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            pages: Vec::new(),
            metadata: DocumentMetadata::default(),
            status: DocumentStatus::Failure,
            error_message: Some(message.into()),
        }
    }

    /// Whether extraction succeeded.
    pub fn is_success(&self) -> bool {
        self.status == DocumentStatus::Success
    }

    /// Page contents joined by blank lines.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Flatten extraction results into per-page texts for an application.
///
/// Documents keep their given order, pages keep document order, and failed
/// documents contribute nothing.
pub fn document_texts<'a, I>(results: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a DocumentExtractionResult>,
{
    results
        .into_iter()
        .filter(|r| r.is_success())
        .flat_map(|r| r.pages.iter().map(|p| p.content.clone()))
        .collect()
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS` with optional trailing
/// timezone) into a naive timestamp. Missing trailing components default
/// to their minimum value.
pub fn parse_pdf_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };

    let year = digits.get(0..4)?.parse::<i32>().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
