//! Combining document texts into one loan extraction.

use tracing::info;

use crate::error::ExtractionError;
use crate::llm::{CompletionModel, ProviderClient};
use crate::models::config::LlmConfig;
use crate::models::document::{document_texts, DocumentExtractionResult};
use crate::models::loan::ExtractionOutcome;

use super::loan::LoanFieldExtractor;

/// Separator placed between document texts.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Runs one loan extraction over several documents.
pub struct ExtractionOrchestrator<M = ProviderClient> {
    extractor: LoanFieldExtractor<M>,
}

impl ExtractionOrchestrator<ProviderClient> {
    /// Build an orchestrator for the provider selected in the configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ExtractionError> {
        Ok(Self::new(LoanFieldExtractor::from_config(config)?))
    }
}

impl<M: CompletionModel> ExtractionOrchestrator<M> {
    pub fn new(extractor: LoanFieldExtractor<M>) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &LoanFieldExtractor<M> {
        &self.extractor
    }

    /// Join the texts, in order, and extract loan fields from the result.
    pub async fn process<S: AsRef<str>>(&self, texts: &[S]) -> ExtractionOutcome {
        let combined = texts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);

        info!(
            "Extracting loan fields from {} document(s), {} chars",
            texts.len(),
            combined.chars().count()
        );
        self.extractor.extract(&combined).await
    }

    /// Extract loan fields from the successful documents among `results`.
    pub async fn process_documents(&self, results: &[DocumentExtractionResult]) -> ExtractionOutcome {
        self.process(&document_texts(results)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{DocumentMetadata, ExtractedPage, PageSource};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Captures the document text embedded in each prompt.
    #[derive(Default)]
    struct RecordingModel {
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionModel for RecordingModel {
        async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
            let text = prompt
                .split_once("Document Text:\n")
                .and_then(|(_, rest)| rest.rsplit_once("\n\nExtracted Information:"))
                .map(|(text, _)| text.to_string())
                .unwrap_or_default();
            self.texts.lock().unwrap().push(text);
            Ok(r#"{"loan_amount": 1000, "interest_rate": 5, "tenure_months": 12,
                "borrower_name": "A", "loan_purpose": "B", "confidence_score": 0.5}"#
                .to_string())
        }
    }

    fn orchestrator() -> ExtractionOrchestrator<RecordingModel> {
        ExtractionOrchestrator::new(LoanFieldExtractor::with_model(RecordingModel::default()))
    }

    fn recorded(orchestrator: &ExtractionOrchestrator<RecordingModel>) -> Vec<String> {
        orchestrator.extractor().model().texts.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_texts_are_joined_in_order() {
        let orchestrator = orchestrator();
        let outcome = orchestrator.process(&["A", "B"]).await;

        assert!(outcome.is_success());
        assert_eq!(recorded(&orchestrator), vec!["A\n\nB".to_string()]);
    }

    #[tokio::test]
    async fn test_application_documents_make_one_call() {
        let orchestrator = orchestrator();
        orchestrator
            .process(&[
                "Loan for $10,000 at 7% for 24 months",
                "Borrower: John Smith",
            ])
            .await;

        assert_eq!(
            recorded(&orchestrator),
            vec!["Loan for $10,000 at 7% for 24 months\n\nBorrower: John Smith".to_string()]
        );
    }

    #[tokio::test]
    async fn test_single_and_empty_inputs() {
        let orchestrator = orchestrator();
        orchestrator.process(&["only".to_string()]).await;
        orchestrator.process::<&str>(&[]).await;

        assert_eq!(recorded(&orchestrator), vec!["only".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn test_non_ascii_text_is_passed_through() {
        let orchestrator = orchestrator();
        orchestrator.process(&["Kreditnehmer: Jürgen Groß", "Betrag: 10.000 €"]).await;

        assert_eq!(
            recorded(&orchestrator),
            vec!["Kreditnehmer: Jürgen Groß\n\nBetrag: 10.000 €".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_documents_are_skipped() {
        let page = |n: u32, content: &str| ExtractedPage {
            page_number: n,
            content: content.to_string(),
            source: PageSource::Native,
        };
        let results = vec![
            DocumentExtractionResult::success(
                vec![page(1, "first page"), page(2, "second page")],
                DocumentMetadata::default(),
            ),
            DocumentExtractionResult::failure("not a PDF document"),
            DocumentExtractionResult::success(vec![page(1, "other doc")], DocumentMetadata::default()),
        ];

        let orchestrator = orchestrator();
        orchestrator.process_documents(&results).await;

        assert_eq!(
            recorded(&orchestrator),
            vec!["first page\n\nsecond page\n\nother doc".to_string()]
        );
    }
}
