//! CLI output formatting utilities.

use crate::report::{SyncReport, WarningCategory};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print the counts and warnings of a sync report.
    pub fn report(report: &SyncReport) {
        Output::kv(
            "Segments",
            &format!(
                "{} synced, {} excluded, {} total",
                report.segments_synced, report.segments_excluded, report.segments_total
            ),
        );
        Output::kv("Cues", &report.cue_count.to_string());

        if !report.has_warnings() {
            return;
        }

        for category in [
            WarningCategory::Adapter,
            WarningCategory::Timing,
            WarningCategory::Quality,
            WarningCategory::Format,
        ] {
            let warnings: Vec<_> = report.warnings_in(category).collect();
            if warnings.is_empty() {
                continue;
            }
            println!("  {} ({})", style(category_label(category)).yellow(), warnings.len());
            for warning in warnings {
                println!("    {} {}", style("-").dim(), warning);
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn category_label(category: WarningCategory) -> &'static str {
    match category {
        WarningCategory::Timing => "Timing",
        WarningCategory::Adapter => "Excluded segments",
        WarningCategory::Format => "Formats",
        WarningCategory::Quality => "Transcript quality",
    }
}
