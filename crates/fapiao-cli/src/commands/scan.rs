//! Scan command - batch a set of invoice files into one spreadsheet.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use fapiao_core::{
    assemble, suggested_filename, BatchAggregator, BatchError, HttpVisionClient, UploadedFile,
};

use super::{load_config, PromptArg};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output xlsx path (default: 所有发票_<timestamp>.xlsx in the
    /// current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction prompt to use (overrides config)
    #[arg(short, long, value_enum)]
    prompt: Option<PromptArg>,
}

pub fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // .env is optional; the API key env var may be set directly
    let _ = dotenvy::dotenv();

    // Expand glob patterns, keeping a stable sorted order per pattern
    let mut paths: Vec<PathBuf> = Vec::new();
    for input in &args.inputs {
        let mut matched: Vec<PathBuf> = glob(input)?.filter_map(|r| r.ok()).collect();
        if matched.is_empty() {
            // Not a pattern: treat as a literal path so missing files
            // surface as a read error below
            matched.push(PathBuf::from(input));
        }
        matched.sort();
        paths.extend(matched);
    }

    println!(
        "{} Found {} file(s) to process",
        style("ℹ").blue(),
        paths.len()
    );

    // Read files in order; the aggregator owns them from here
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("invoice")
            .to_string();
        let content = fs::read(path)?;
        debug!("read {} ({} bytes)", path.display(), content.len());
        files.push(UploadedFile::new(filename, content));
    }

    let client = HttpVisionClient::new(&config.vision)?;
    let prompt = args.prompt.map(Into::into).unwrap_or(config.prompt);
    let aggregator = BatchAggregator::new(client)
        .with_limits(config.limits.clone())
        .with_image_config(&config.image)
        .with_prompt(prompt);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("extracting {} file(s)...", files.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = match aggregator.run(files) {
        Ok(report) => report,
        Err(e @ (BatchError::TooManyFiles { .. } | BatchError::PayloadTooLarge { .. })) => {
            spinner.finish_and_clear();
            anyhow::bail!("batch rejected: {}", e);
        }
        Err(BatchError::NoInvoicesProcessed) => {
            spinner.finish_and_clear();
            anyhow::bail!("could not process any invoices");
        }
    };

    spinner.finish_and_clear();

    let bytes = assemble(&report.records)?;
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(suggested_filename()));
    fs::write(&output_path, &bytes)?;

    println!(
        "{} Saved {} invoice(s) to {} in {:?}",
        style("✓").green(),
        style(report.records.len()).green(),
        output_path.display(),
        start.elapsed()
    );

    if !report.skipped.is_empty() {
        println!();
        println!("{}", style("Skipped files:").red());
        for skip in &report.skipped {
            println!("  - {}: {}", skip.filename, skip.reason);
        }
    }

    Ok(())
}
