//! Error types for the loandoc-core library.

use thiserror::Error;

/// Main error type for the loandoc library.
#[derive(Error, Debug)]
pub enum LoandocError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Loan field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Document storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading a PDF document.
///
/// Every variant aborts extraction of the whole document.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The bytes are not a PDF document.
    #[error("not a PDF document")]
    NotPdf,

    /// The document exceeds the configured upload limit.
    #[error("document too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to render a page for OCR.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to loan field extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The requested provider is unknown or has no credential configured.
    #[error("invalid or unconfigured LLM provider: {0}")]
    ProviderConfiguration(String),

    /// Communication with the language model failed (network, status, timeout).
    #[error("LLM call failed: {0}")]
    ProviderCall(String),

    /// The model response does not conform to the loan schema.
    #[error("failed to parse model output: {0}")]
    OutputParse(String),

    /// Parsed data failed domain validation.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Errors related to persisting uploaded documents.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Writing the document failed.
    #[error("failed to store {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for the loandoc library.
pub type Result<T> = std::result::Result<T, LoandocError>;
