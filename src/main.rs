mod cli;
mod core;
mod execution;
mod tools;
mod util;

use anyhow::{Context, Result};
use cli::commands::{BuildCommand, ValidateCommand};
use cli::output::*;
use cli::{Cli, Command};
use crate::core::config::PackageDescriptor;
use crate::execution::{BuildEvent, PackageBuildDriver};
use crate::tools::CommandToolChain;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Build(cmd) => build_package(cmd).await?,
        Command::Validate(cmd) => validate_package(cmd)?,
    }

    Ok(())
}

async fn build_package(cmd: &BuildCommand) -> Result<()> {
    // Load the descriptor
    let descriptor = PackageDescriptor::from_file(&cmd.project)
        .context("Failed to load package descriptor")?;

    println!(
        "{} Loaded package: {}",
        INFO,
        style(&descriptor.name).bold()
    );

    // Create the tool chain from the descriptor's command table
    let tools = CommandToolChain::new(descriptor.tools.clone());
    let mut driver = PackageBuildDriver::new(tools);

    // Set up event handler for console output
    let progress = Arc::new(create_progress_bar(1 + descriptor.secondaries.len()));
    let bar = progress.clone();
    driver.add_event_handler(move |event| {
        bar.println(format_build_event(event));
        if let BuildEvent::EntryPointBuilt { .. } = event {
            bar.inc(1);
        }
    });

    // Build the package
    println!();
    let result = driver.build(&cmd.project).await;
    progress.finish_and_clear();

    // Print final status
    match result {
        Ok(report) => {
            println!(
                "\n{} {} built {}",
                CHECK,
                style(&report.package_name).bold(),
                style("successfully").green()
            );
            for entry in &report.entry_points {
                println!(
                    "  {} {}",
                    style(&entry.module_id).bold(),
                    format_build_status(entry.status)
                );
            }
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&descriptor.name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate_package(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating package descriptor...", INFO);

    match PackageDescriptor::from_file(&cmd.project) {
        Ok(descriptor) => {
            println!("{} Package descriptor is valid!", CHECK);
            println!("  Name: {}", style(&descriptor.name).bold());
            println!(
                "  Entry points: {}",
                style(1 + descriptor.secondaries.len()).cyan()
            );

            if cmd.json {
                let json = serde_json::to_string_pretty(&descriptor)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}
