//! Extract command - page text of a single PDF.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::{debug, info};

use super::{build_pipeline, load_config, read_input, write_output};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let data = read_input(&args.input)?;

    info!("Extracting text from {}", args.input.display());
    let pipeline = build_pipeline(&config);
    let result = pipeline.extract(&data);

    write_output(&serde_json::to_string_pretty(&result)?, args.output.as_deref())?;
    debug!("Total processing time: {:?}", start.elapsed());

    if let Some(message) = &result.error_message {
        anyhow::bail!("Extraction failed: {}", message);
    }
    Ok(())
}
