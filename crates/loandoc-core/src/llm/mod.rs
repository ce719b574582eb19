//! Language model access for loan field extraction.

mod parser;
mod prompt;
mod provider;

pub use parser::parse_loan_info;
pub use prompt::{format_instructions, PromptTemplate};
pub use provider::ProviderClient;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Supported language model vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Cohere,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Cohere];

    /// Configuration name of the provider.
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Cohere => "cohere",
        }
    }

    /// Look up a provider by its configuration name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Model used when the configuration does not name one.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
            Provider::Cohere => "command-r-plus",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A model that turns a prompt into a completion.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send a single-turn prompt and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError>;
}

#[async_trait]
impl<T: CompletionModel + ?Sized> CompletionModel for Box<T> {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        (**self).complete(prompt).await
    }
}

#[async_trait]
impl<T: CompletionModel + ?Sized> CompletionModel for std::sync::Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        (**self).complete(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_name() {
        assert_eq!(Provider::from_name("openai"), Some(Provider::OpenAi));
        assert_eq!(Provider::from_name(" Anthropic "), Some(Provider::Anthropic));
        assert_eq!(Provider::from_name("COHERE"), Some(Provider::Cohere));
        assert_eq!(Provider::from_name("mistral"), None);
        assert_eq!(Provider::from_name(""), None);
    }

    #[test]
    fn test_provider_names_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_name(provider.name()), Some(provider));
            assert_eq!(provider.to_string(), provider.name());
        }
    }
}
