//! Document text extraction and loan field extraction.

mod document;
mod loan;
mod orchestrator;
pub mod page;

pub use document::{DocumentExtractionPipeline, DEFAULT_MAX_FILE_SIZE};
pub use loan::LoanFieldExtractor;
pub use orchestrator::{ExtractionOrchestrator, DOCUMENT_SEPARATOR};
pub use page::{needs_ocr, PageTextExtractor};
