//! Process command - extract loan information from application documents.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use loandoc_core::pdf::validate_upload;
use loandoc_core::storage::{DocumentStore, LocalStore};
use loandoc_core::{document_texts, ExtractionOrchestrator, ExtractionOutcome, LoanInfo};

use super::{build_pipeline, load_config, read_input, write_output};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF files, combined into one application
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Keep a copy of each input in the configured upload directory
    #[arg(long)]
    store: bool,

    /// Report extracted data even if it fails validation
    #[arg(long)]
    skip_validation: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    let orchestrator = match ExtractionOrchestrator::from_config(&config.llm) {
        Ok(orchestrator) => orchestrator,
        Err(e) => return report(&ExtractionOutcome::from(e), &args),
    };

    let store = LocalStore::new(&config.storage.upload_dir);
    let pipeline = build_pipeline(&config);

    let pb = ProgressBar::new(args.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut results = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        pb.set_message(display_name(input));

        let data = read_input(input)?;
        if let Err(e) = validate_upload(&data, config.pdf.max_file_size) {
            pb.abandon();
            anyhow::bail!("{}: {}", input.display(), e);
        }

        if args.store {
            let path = store.put(&display_name(input), &data)?;
            info!("Stored {} at {}", input.display(), path.display());
        }

        let result = pipeline.extract(&data);
        if let Some(message) = &result.error_message {
            warn!("No text from {}: {}", input.display(), message);
        }
        results.push(result);
        pb.inc(1);
    }

    let texts = document_texts(&results);
    if texts.is_empty() {
        pb.finish_and_clear();
        anyhow::bail!("No documents found for this loan application");
    }

    pb.set_message("Extracting loan information...");
    let mut outcome = orchestrator.process(&texts).await;
    pb.finish_and_clear();

    if !args.skip_validation {
        outcome = outcome.validated();
    }

    debug!("Total processing time: {:?}", start.elapsed());
    report(&outcome, &args)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print the outcome and turn an error outcome into a failing exit status.
fn report(outcome: &ExtractionOutcome, args: &ProcessArgs) -> anyhow::Result<()> {
    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome)?,
        OutputFormat::Text => format_text(outcome),
    };
    write_output(&output, args.output.as_deref())?;

    match outcome {
        ExtractionOutcome::Success { .. } => Ok(()),
        ExtractionOutcome::Error {
            error_kind,
            error_message,
        } => anyhow::bail!("Loan extraction failed ({}): {}", error_kind, error_message),
    }
}

fn format_text(outcome: &ExtractionOutcome) -> String {
    match outcome {
        ExtractionOutcome::Success { data } => format_loan(data),
        ExtractionOutcome::Error {
            error_kind,
            error_message,
        } => format!(
            "{} {} ({})\n",
            style("✗").red(),
            error_message,
            error_kind
        ),
    }
}

fn format_loan(loan: &LoanInfo) -> String {
    let mut output = String::new();

    output.push_str(&format!("Borrower:      {}\n", loan.borrower_name));
    output.push_str(&format!("Purpose:       {}\n", loan.loan_purpose));
    output.push('\n');
    output.push_str(&format!("Amount:        {:.2}\n", loan.loan_amount));
    output.push_str(&format!("Interest rate: {}%\n", loan.interest_rate));
    output.push_str(&format!("Tenure:        {} months\n", loan.tenure_months));
    output.push('\n');
    output.push_str(&format!(
        "Confidence:    {:.1}%\n",
        loan.confidence_score * 100.0
    ));

    output
}
