//! CLI application for batch invoice scanning.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{extract, scan};

/// fapiao - turn a folder of invoice photos into one spreadsheet
#[derive(Parser)]
#[command(name = "fapiao")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a batch of invoice files into a combined xlsx
    Scan(scan::ScanArgs),

    /// Extract raw data from a single invoice file (debug aid)
    Extract(extract::ExtractArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Scan(args) => scan::run(args, cli.config.as_deref()),
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()),
    }
}
