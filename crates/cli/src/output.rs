// Output formatting for CLI

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use sayr_core::bench::BenchmarkSummary;
use sayr_core::config::ErrorPolicy;
use sayr_core::events::{BenchEvent, EventSink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        match self {
            OutputFormat::Json => {
                let rendered =
                    serde_json::to_string_pretty(value).context("Failed to render JSON")?;
                println!("{rendered}");
            }
            OutputFormat::Yaml => {
                let rendered = serde_yaml::to_string(value).context("Failed to render YAML")?;
                println!("{rendered}");
            }
            OutputFormat::Text => {
                // Text format is handled by each command
            }
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Machine-readable result of one benchmark command
#[derive(Debug, Serialize)]
pub struct BenchmarkReport<T: Serialize> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub runner: &'static str,
    pub policy: ErrorPolicy,
    pub results: T,
}

impl<T: Serialize> BenchmarkReport<T> {
    pub fn new(
        runner: &'static str,
        policy: ErrorPolicy,
        started_at: DateTime<Utc>,
        results: T,
    ) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at,
            runner,
            policy,
            results,
        }
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print one summary line: path, mean, and how many trials produced a sample
pub fn print_summary(label: &str, summary: &BenchmarkSummary) {
    println!(
        "{} Average: {:.4}s ({}/{} succeeded)",
        label, summary.mean_secs, summary.succeeded, summary.iterations
    );
}

/// Renders run events as console progress lines
///
/// Only active for text output without `--quiet`, so json/yaml stdout stays parseable.
pub struct ConsoleSink {
    enabled: bool,
}

impl ConsoleSink {
    pub fn new(output: OutputFormat, quiet: bool) -> Self {
        Self {
            enabled: output.is_text() && !quiet,
        }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: BenchEvent) {
        if !self.enabled {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        // Console progress is best effort; a closed stdout must not fail the run
        let _ = match event {
            BenchEvent::RunStarted { path, iterations } => {
                writeln!(stdout, "\n--- Testing {path} ({iterations} iterations) ---")
            }
            BenchEvent::TrialStarted {
                iteration, total, ..
            } => write!(stdout, "Iteration {}/{}...", iteration + 1, total)
                .and_then(|_| stdout.flush()),
            BenchEvent::TrialSucceeded { elapsed, .. } => {
                writeln!(stdout, " {:.4}s", elapsed.as_secs_f64())
            }
            BenchEvent::TrialFailed { message, .. } => writeln!(stdout, "FAILED: {message}"),
            BenchEvent::RunCompleted(summary) => writeln!(
                stdout,
                "{} Average: {:.4}s",
                summary.path, summary.mean_secs
            ),
            BenchEvent::StagePassed { detail, .. } => writeln!(stdout, "MATCH: {detail}"),
        };
    }
}
