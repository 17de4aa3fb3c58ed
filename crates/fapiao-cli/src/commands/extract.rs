//! Extract command - raw extraction output for a single file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use fapiao_core::{HttpVisionClient, ImagePreparer, MediaType, VisionClient};

use super::{load_config, PromptArg};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction prompt to use (overrides config)
    #[arg(short, long, value_enum)]
    prompt: Option<PromptArg>,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let _ = dotenvy::dotenv();

    let filename = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice")
        .to_string();

    let media_type = MediaType::from_filename(&filename)
        .ok_or_else(|| anyhow::anyhow!("unsupported file type: {}", filename))?;

    let content = fs::read(&args.input)?;
    info!("read {} ({} bytes)", args.input.display(), content.len());

    let payload = match media_type {
        MediaType::Image => ImagePreparer::new(&config.image).prepare(&content),
        MediaType::Pdf => content,
    };

    let client = HttpVisionClient::new(&config.vision)?;
    let prompt = args.prompt.map(Into::into).unwrap_or(config.prompt);
    let raw = client.extract(&payload, prompt)?;

    let pretty = serde_json::to_string_pretty(&raw)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &pretty)?;
        println!(
            "{} Wrote extraction to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", pretty);
    }

    Ok(())
}
