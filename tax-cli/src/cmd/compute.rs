//! `compute`: run the engine over a scenario file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tax_data::parse_scenario;
use tracing::{info, warn};

use super::{OutputFormat, ProfileArgs, read_input};
use crate::report::render_text;

#[derive(Args, Debug)]
pub struct ComputeCommand {
    /// JSON scenario file (`-` for stdin)
    #[arg(short, long)]
    scenario: PathBuf,

    #[command(flatten)]
    profile: ProfileArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl ComputeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let engine = self.profile.engine()?;
        let text = read_input(&self.scenario)?;
        let scenario = parse_scenario(&text)
            .with_context(|| format!("invalid scenario '{}'", self.scenario.display()))?;
        let inputs = scenario.into_inputs();
        if !inputs.alerts.is_empty() {
            warn!(
                alerts = inputs.alerts.len(),
                "extracted documents needed coercion"
            );
        }

        let mut result = engine.compute(&inputs.taxpayer, &inputs.income, &inputs.deductions);
        // Boundary alerts first, then the engine's own.
        let engine_alerts = std::mem::take(&mut result.alerts);
        result.alerts = inputs.alerts;
        result.alerts.extend(engine_alerts);

        info!(
            tax_year = engine.profile().tax_year,
            status = %inputs.taxpayer.filing_status,
            income_records = inputs.income.len(),
            deduction_records = inputs.deductions.len(),
            liability = %result.total_liability,
            "computed scenario"
        );

        match self.format {
            OutputFormat::Text => print!("{}", render_text(inputs.taxpayer.filing_status, &result)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        }
        Ok(())
    }
}
