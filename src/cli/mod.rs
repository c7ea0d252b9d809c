//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{BuildCommand, ValidateCommand};
use std::ffi::OsString;

/// Flat-module package builder
#[derive(Debug, Parser, Clone)]
#[command(name = "flatpack")]
#[command(author = "Flatpack Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Builds library packages as flat module bundles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a package
    Build(BuildCommand),

    /// Validate a package descriptor
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
