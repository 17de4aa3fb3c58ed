//! CLI subcommands.

pub mod extract;
pub mod scan;

use std::path::Path;

use clap::ValueEnum;

use fapiao_core::{FapiaoConfig, PromptVariant};

/// Extraction prompt selection on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PromptArg {
    /// Flat item list with a date
    FlatItems,
    /// Free-form row table
    RawRows,
}

impl From<PromptArg> for PromptVariant {
    fn from(arg: PromptArg) -> Self {
        match arg {
            PromptArg::FlatItems => PromptVariant::FlatItems,
            PromptArg::RawRows => PromptVariant::RawRows,
        }
    }
}

/// Load the config file if given, otherwise defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FapiaoConfig> {
    let config = if let Some(path) = config_path {
        FapiaoConfig::from_file(Path::new(path))?
    } else {
        FapiaoConfig::default()
    };
    Ok(config)
}
