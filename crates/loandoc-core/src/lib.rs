//! Core library for loan document processing.
//!
//! This crate provides:
//! - PDF text extraction with per-page OCR fallback for scanned pages
//! - Loan field extraction (amount, rate, tenure, borrower, purpose) with
//!   hosted language models
//! - Validation of extracted loan data
//! - Local storage of uploaded documents

pub mod error;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod storage;

pub use error::{ExtractionError, LoandocError, Result};
pub use extraction::{DocumentExtractionPipeline, ExtractionOrchestrator, LoanFieldExtractor};
pub use llm::{CompletionModel, Provider, ProviderClient};
pub use models::config::LoandocConfig;
pub use models::document::{
    document_texts, DocumentExtractionResult, DocumentMetadata, ExtractedPage, PageSource,
};
pub use models::loan::{ExtractionOutcome, FailureKind, LoanInfo};
pub use ocr::{OcrEngine, UnavailableOcr};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{validate_upload, PdfExtractor, PdfProcessor};
pub use storage::{DocumentStore, LocalStore};
