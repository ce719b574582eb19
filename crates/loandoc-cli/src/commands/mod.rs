//! Subcommands and the setup they share.

pub mod config;
pub mod extract;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use loandoc_core::models::config::LoandocConfig;
use loandoc_core::ocr::{OcrEngine, PureOcrEngine, UnavailableOcr};
use loandoc_core::DocumentExtractionPipeline;

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loandoc")
        .join("config.json")
}

/// Load configuration from `path`, or the user config file if present,
/// then apply environment overrides.
pub fn load_config(path: Option<&str>) -> anyhow::Result<LoandocConfig> {
    let mut config = match path {
        Some(path) => LoandocConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                debug!("Using config {}", default_path.display());
                LoandocConfig::from_file(&default_path)?
            } else {
                LoandocConfig::default()
            }
        }
    };

    config.apply_env();
    Ok(config)
}

/// Document pipeline with the configured OCR engine.
///
/// Missing OCR models are not fatal: documents with a text layer still
/// extract, scanned pages fail their document.
pub fn build_pipeline(config: &LoandocConfig) -> DocumentExtractionPipeline<Box<dyn OcrEngine>> {
    let ocr: Box<dyn OcrEngine> = match PureOcrEngine::from_config(&config.ocr) {
        Ok(engine) => Box::new(engine),
        Err(e) => {
            warn!("OCR unavailable, scanned pages will fail: {}", e);
            Box::new(UnavailableOcr::new(e.to_string()))
        }
    };

    DocumentExtractionPipeline::from_config(ocr, &config.pdf)
}

/// Read an input document, failing early with a readable message.
pub fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(fs::read(path)?)
}

/// Print to stdout or write to a file.
pub fn write_output(output: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output)?;
            eprintln!(
                "{} Output written to {}",
                console::style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", output),
    }
    Ok(())
}
