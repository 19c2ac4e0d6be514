use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

mod cmd;
mod logging;
mod report;

use cmd::{compute::ComputeCommand, normalize::NormalizeCommand, profile::ProfileCommand};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Federal individual income tax liability engine.
///
/// Computes a full return snapshot (AGI, deductions, regular tax, AMT,
/// credits, surtaxes, refund or balance due) from a JSON scenario.
#[derive(Debug, Parser)]
#[command(name = "tax-engine", version)]
struct Cli {
    /// Log level or filter directive; `RUST_LOG` takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also append log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute a return from a scenario file
    Compute(ComputeCommand),
    /// Normalize an extracted-document payload into typed records
    Normalize(NormalizeCommand),
    /// Print the effective tax-year profile as TOML
    Profile(ProfileCommand),
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_file.as_deref())?;
    debug!(command = ?cli.command, "starting");

    match &cli.command {
        Command::Compute(command) => command.exec(),
        Command::Normalize(command) => command.exec(),
        Command::Profile(command) => command.exec(),
    }
}
