//! CLI output formatting

use crate::core::BuildStatus;
use crate::execution::BuildEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the package's entry points
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a build status for display
pub fn format_build_status(status: BuildStatus) -> String {
    match status {
        BuildStatus::Pending => style("PENDING").dim().to_string(),
        BuildStatus::InProgress => style("IN PROGRESS").yellow().to_string(),
        BuildStatus::Success => style("SUCCESS").green().to_string(),
        BuildStatus::Error => style("ERROR").red().to_string(),
    }
}

/// Format a build event for display
pub fn format_build_event(event: &BuildEvent) -> String {
    match event {
        BuildEvent::PackageStarted {
            name,
            total_entry_points,
            ..
        } => format!(
            "{} Building {} ({} entry points)",
            ROCKET,
            style(name).bold(),
            style(total_entry_points).cyan()
        ),
        BuildEvent::EntryPointStarted { module_id } => {
            format!("{} Building entry point {}", SPINNER, style(module_id).bold())
        }
        BuildEvent::EntryPointDeferred { module_id, missing } => format!(
            "{} Deferred {} (waiting on {})",
            WARN,
            style(module_id).bold(),
            style(missing.join(", ")).dim()
        ),
        BuildEvent::EntryPointBuilt { module_id } => {
            format!("{} Built {}", CHECK, style(module_id).bold())
        }
        BuildEvent::PackageCompleted { .. } => {
            format!("{} Package {}", CHECK, style("built successfully").green())
        }
        BuildEvent::PackageFailed { error, .. } => {
            format!("{} Package build {}: {}", CROSS, style("failed").red(), error)
        }
    }
}
