//! Loan field extraction from document text.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::error::ExtractionError;
use crate::llm::{parse_loan_info, CompletionModel, PromptTemplate, ProviderClient};
use crate::models::config::LlmConfig;
use crate::models::loan::{ExtractionOutcome, LoanInfo};

/// Extracts `LoanInfo` from text with a language model.
pub struct LoanFieldExtractor<M = ProviderClient> {
    model: M,
    prompt: PromptTemplate,
    timeout: Option<Duration>,
}

impl LoanFieldExtractor<ProviderClient> {
    /// Build an extractor for the provider selected in the configuration.
    ///
    /// Fails with `ProviderConfiguration` when the provider is unknown or
    /// has no credential.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ExtractionError> {
        Ok(Self::with_model(ProviderClient::from_config(config)?))
    }
}

impl<M: CompletionModel> LoanFieldExtractor<M> {
    /// Use an arbitrary completion model.
    pub fn with_model(model: M) -> Self {
        Self {
            model,
            prompt: PromptTemplate::new(),
            timeout: None,
        }
    }

    /// Abort model calls that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the prompt template.
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Extract loan fields from document text.
    ///
    /// Never fails: errors are reported in the outcome. The data is not
    /// validated; see [`ExtractionOutcome::validated`].
    pub async fn extract(&self, text: &str) -> ExtractionOutcome {
        match self.try_extract(text).await {
            Ok(data) => ExtractionOutcome::Success { data },
            Err(e) => {
                error!("Error extracting loan information: {}", e);
                e.into()
            }
        }
    }

    async fn try_extract(&self, text: &str) -> Result<LoanInfo, ExtractionError> {
        let start = Instant::now();
        let prompt = self.prompt.render(text);

        let completion = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.complete(&prompt))
                .await
                .map_err(|_| {
                    ExtractionError::ProviderCall(format!(
                        "model did not respond within {}s",
                        limit.as_secs_f32()
                    ))
                })??,
            None => self.model.complete(&prompt).await?,
        };

        let info = parse_loan_info(&completion)?;
        info!(
            "Extracted loan fields for {:?} in {}ms",
            info.borrower_name,
            start.elapsed().as_millis()
        );
        Ok(info)
    }
}
