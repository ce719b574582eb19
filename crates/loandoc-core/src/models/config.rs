//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::Provider;

/// Main configuration for the loandoc pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoandocConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Language model configuration.
    pub llm: LlmConfig,

    /// Uploaded document storage.
    pub storage: StorageConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Minimum trimmed native text length before a page is sent to OCR.
    pub min_text_length: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Maximum accepted upload size in bytes.
    pub max_file_size: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            min_text_length: 50,
            max_pages: 0,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Maximum image dimension (longer side) passed to the engine.
    pub max_image_size: u32,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            max_image_size: 2048,
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Name of the active provider (`openai`, `anthropic` or `cohere`).
    pub provider: String,

    /// OpenAI settings.
    pub openai: ProviderSettings,

    /// Anthropic settings.
    pub anthropic: ProviderSettings,

    /// Cohere settings.
    pub cohere: ProviderSettings,

    /// Sampling temperature. Zero keeps extraction deterministic.
    pub temperature: f32,

    /// Upper bound on generated tokens.
    pub max_tokens: u32,

    /// Request timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi.name().to_string(),
            openai: ProviderSettings::default(),
            anthropic: ProviderSettings::default(),
            cohere: ProviderSettings::default(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Settings block for a provider.
    pub fn settings(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Cohere => &self.cohere,
        }
    }

    /// Credential for a provider, if one is set and non-empty.
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        self.settings(provider)
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Model identifier for a provider, falling back to the provider default.
    pub fn model(&self, provider: Provider) -> &str {
        self.settings(provider)
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(provider.default_model())
    }
}

/// Per-provider connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Override for the API base URL (proxies, tests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Uploaded document storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded documents are written to.
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("media"),
        }
    }
}

impl LoandocConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply overrides from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognized keys: `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
    /// `COHERE_API_KEY`, `LOANDOC_LLM_PROVIDER`, `LOANDOC_UPLOAD_DIR`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.openai.api_key = Some(key);
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.llm.anthropic.api_key = Some(key);
        }
        if let Some(key) = lookup("COHERE_API_KEY") {
            self.llm.cohere.api_key = Some(key);
        }
        if let Some(provider) = lookup("LOANDOC_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(dir) = lookup("LOANDOC_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LoandocConfig::default();
        assert_eq!(config.pdf.min_text_length, 50);
        assert_eq!(config.pdf.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.temperature, 0.0);
        assert!(config.llm.api_key(Provider::OpenAi).is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "llm": { "provider": "cohere", "cohere": { "api_key": "abc" } } }"#;
        let config: LoandocConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.llm.provider, "cohere");
        assert_eq!(config.llm.api_key(Provider::Cohere), Some("abc"));
        assert_eq!(config.llm.model(Provider::Cohere), "command-r-plus");
        assert_eq!(config.pdf.render_dpi, 300);
    }

    #[test]
    fn test_blank_api_key_is_unconfigured() {
        let mut config = LoandocConfig::default();
        config.llm.anthropic.api_key = Some("   ".to_string());
        assert!(config.llm.api_key(Provider::Anthropic).is_none());
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("LOANDOC_LLM_PROVIDER", "anthropic"),
            ("LOANDOC_UPLOAD_DIR", "/tmp/uploads"),
        ]
        .into_iter()
        .collect();

        let mut config = LoandocConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key(Provider::Anthropic), Some("sk-ant"));
        assert!(config.llm.api_key(Provider::OpenAi).is_none());
        assert_eq!(config.storage.upload_dir, PathBuf::from("/tmp/uploads"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = LoandocConfig::default();
        config.pdf.min_text_length = 80;
        config.save(&path).unwrap();

        let loaded = LoandocConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.min_text_length, 80);
        assert_eq!(loaded.llm.model(Provider::OpenAi), "gpt-4");
    }
}
