//! Terminal output: log setup and the end-of-run summary

use crate::runner::{RunSummary, TaskStatus, Verbosity};
use colored::Colorize;
use tracing::level_filters::LevelFilter;

/// Log level for a verbosity setting
pub fn level_for(verbosity: Verbosity) -> LevelFilter {
    match verbosity {
        Verbosity::Silent => LevelFilter::OFF,
        Verbosity::Quiet => LevelFilter::ERROR,
        Verbosity::Normal => LevelFilter::INFO,
        Verbosity::Verbose => LevelFilter::DEBUG,
    }
}

/// Install the global log subscriber, writing to stderr
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_logging(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Render the run summary, one line per task
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = Vec::with_capacity(summary.tasks.len() + 1);

    for task in &summary.tasks {
        let marker = match task.status {
            TaskStatus::Succeeded => "ok".green().bold(),
            TaskStatus::Failed => "failed".red().bold(),
            TaskStatus::Pending => "skipped".yellow(),
        };
        lines.push(format!(
            "  {:<8} {} ({}/{} actions)",
            marker,
            task.name,
            task.executed,
            task.total
        ));
    }

    let verdict = if summary.success() {
        "succeeded".green()
    } else {
        "failed".red()
    };
    lines.push(format!("{} {}", summary.pipeline.bold(), verdict));

    lines.join("\n")
}

pub fn print_summary(summary: &RunSummary, verbosity: Verbosity) {
    if verbosity > Verbosity::Silent {
        eprintln!("{}", format_summary(summary));
    }
}
