//! Rendering of probe results and remediation outcomes.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write as IoWrite;
use std::path::Path;

use crate::remediate::{CheckResult, RemediationOutcome};

/// Output format for CLI results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Text,
}

/// Format a single probe result as text.
#[must_use]
pub fn format_check_text(result: &CheckResult) -> String {
    use std::fmt::Write;
    let mut output = String::new();

    let status = if result.healthy {
        "healthy".green()
    } else {
        "unhealthy".red()
    };
    writeln!(output, "{}: {} ({})", result.name, status, result.detail).unwrap();
    writeln!(output, "Observed: {}", result.observed_at).unwrap();

    output
}

/// Format a remediation outcome as text.
#[must_use]
pub fn format_outcome_text(outcome: &RemediationOutcome) -> String {
    use std::fmt::Write;
    let mut output = String::new();

    writeln!(output, "=== Remediation Report ===").unwrap();
    writeln!(output, "Resource: {}", outcome.last_result.name).unwrap();
    writeln!(output, "Attempts: {}", outcome.attempts).unwrap();
    let verdict = if outcome.succeeded {
        "recovered".green()
    } else {
        "still unhealthy".red()
    };
    writeln!(output, "Result: {verdict}").unwrap();
    writeln!(output, "Last check: {}", outcome.last_result.detail).unwrap();
    writeln!(output, "Observed: {}", outcome.last_result.observed_at).unwrap();

    output
}

/// Print a result to stdout in the requested format, and optionally append
/// it as a JSON line to a file.
pub fn emit<T: Serialize>(
    value: &T,
    rendered: &str,
    format: OutputFormat,
    output_file: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{rendered}"),
    }

    if let Some(path) = output_file {
        append_jsonl(path, value)?;
    }

    Ok(())
}

fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("Failed to serialize result")?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;
    writeln!(file, "{line}")
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(())
}
