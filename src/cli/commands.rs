//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Build a package
#[derive(Debug, Args, Clone)]
pub struct BuildCommand {
    /// Path to the package descriptor file
    #[arg(short, long, default_value = "flatpack.json")]
    pub project: PathBuf,
}

/// Validate a package descriptor
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the package descriptor file
    #[arg(short, long, default_value = "flatpack.json")]
    pub project: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
