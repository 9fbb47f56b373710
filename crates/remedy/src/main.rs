//! Service remediation CLI
//!
//! Probes the health of a systemd unit and, when it is unhealthy, restarts it
//! with bounded retries and a cooldown between attempts. Results are printed
//! as text or JSON and the exit code follows the outcome: 0 when the unit
//! ends healthy, 1 otherwise.

mod remediate;
mod report;
mod service;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use remediate::{HealthProbe, RemediatorConfig, StatusRemediator};
use report::OutputFormat;
use service::{ServiceProbe, ServiceRestart};

/// Service health remediator - probes a unit and applies bounded-retry restarts
#[derive(Parser)]
#[command(name = "remedy")]
#[command(about = "Service health remediator - probes a unit and applies bounded-retry restarts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (json or text)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output file for JSONL results (in addition to stdout)
    #[arg(long, global = true)]
    output_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe a unit once and report its health (no remediation)
    Status {
        /// Unit name to probe (e.g., nginx.service)
        #[arg(long)]
        unit: String,

        /// Talk to the per-user service manager
        #[arg(long)]
        user: bool,
    },
    /// Probe a unit and, while unhealthy, restart it with bounded retries
    Repair {
        /// Unit name to remediate (e.g., nginx.service)
        #[arg(long)]
        unit: String,

        /// Talk to the per-user service manager
        #[arg(long)]
        user: bool,

        /// Maximum restart attempts
        #[arg(long, default_value = "3")]
        max_attempts: u32,

        /// Seconds to wait between a restart and its re-check
        #[arg(long, default_value = "5")]
        cooldown_secs: u64,

        /// Probe and report but don't restart anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("remedy=debug")
            .init();
    }

    let healthy = match cli.command {
        Commands::Status { unit, user } => {
            let mut probe = ServiceProbe::new(&unit, user);
            let result = probe.check();
            report::emit(
                &result,
                &report::format_check_text(&result),
                cli.format,
                cli.output_file.as_deref(),
            )?;
            result.healthy
        }
        Commands::Repair {
            unit,
            user,
            max_attempts,
            cooldown_secs,
            dry_run,
        } => {
            let config = RemediatorConfig {
                max_attempts,
                cooldown: Duration::from_secs(cooldown_secs),
            };
            let probe = ServiceProbe::new(&unit, user);
            let restart = ServiceRestart::new(&unit, user, dry_run);
            let mut remediator = StatusRemediator::new(config);
            let outcome = remediator.run(probe, restart);
            report::emit(
                &outcome,
                &report::format_outcome_text(&outcome),
                cli.format,
                cli.output_file.as_deref(),
            )?;
            outcome.succeeded
        }
    };

    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}
