//! HTTP clients for the hosted language model APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::LlmConfig;

use super::{CompletionModel, Provider};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const COHERE_BASE_URL: &str = "https://api.cohere.com";

/// Completion client for one configured provider.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    provider: Provider,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    /// Create a client for the provider named in `config.provider`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ExtractionError> {
        let provider = Provider::from_name(&config.provider)
            .ok_or_else(|| ExtractionError::ProviderConfiguration(config.provider.clone()))?;
        Self::new(provider, config)
    }

    /// Create a client for a provider.
    ///
    /// Fails when the provider has no credential configured.
    pub fn new(provider: Provider, config: &LlmConfig) -> Result<Self, ExtractionError> {
        let api_key = config
            .api_key(provider)
            .ok_or_else(|| ExtractionError::ProviderConfiguration(provider.name().to_string()))?
            .to_string();

        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder.build().map_err(|e| {
            ExtractionError::ProviderConfiguration(format!("{}: {}", provider.name(), e))
        })?;

        let base_url = config
            .settings(provider)
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(match provider {
                Provider::OpenAi => OPENAI_BASE_URL,
                Provider::Anthropic => ANTHROPIC_BASE_URL,
                Provider::Cohere => COHERE_BASE_URL,
            })
            .trim_end_matches('/')
            .to_string();

        let model = config.model(provider).to_string();
        info!("Using {} model {}", provider, model);

        Ok(Self {
            http,
            provider,
            api_key,
            model,
            base_url,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &str) -> reqwest::RequestBuilder {
        match self.provider {
            Provider::OpenAi => self
                .http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "temperature": self.temperature,
                    "max_tokens": self.max_tokens,
                })),
            Provider::Anthropic => self
                .http
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "temperature": self.temperature,
                    "max_tokens": self.max_tokens,
                })),
            Provider::Cohere => self
                .http
                .post(format!("{}/v2/chat", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "temperature": self.temperature,
                    "max_tokens": self.max_tokens,
                })),
        }
    }
}

/// Pull the generated text out of a provider response body.
fn completion_text(provider: Provider, body: &Value) -> Option<String> {
    match provider {
        Provider::OpenAi => body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string),
        Provider::Anthropic | Provider::Cohere => {
            let blocks = match provider {
                Provider::Anthropic => body["content"].as_array()?,
                _ => body["message"]["content"].as_array()?,
            };
            let text: String = blocks
                .iter()
                .filter(|b| b["type"].as_str().is_none_or(|t| t == "text"))
                .filter_map(|b| b["text"].as_str())
                .collect();
            (!text.is_empty()).then_some(text)
        }
    }
}

#[async_trait]
impl CompletionModel for ProviderClient {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        debug!("Sending {} char prompt to {}", prompt.len(), self.provider);

        let response = self.request(prompt).send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::ProviderCall(format!("{} request timed out", self.provider))
            } else {
                ExtractionError::ProviderCall(format!("{} request failed: {}", self.provider, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::ProviderCall(format!(
                "{} returned {}: {}",
                self.provider, status, error_text
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            ExtractionError::ProviderCall(format!("{} sent an invalid response: {}", self.provider, e))
        })?;

        completion_text(self.provider, &body).ok_or_else(|| {
            ExtractionError::ProviderCall(format!("no completion in {} response", self.provider))
        })
    }
}
