//! `normalize`: show what the extraction normalizer makes of a document.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tax_core::{ComplianceAlert, DeductionItem, IncomeItem};
use tax_data::normalize_document;
use tracing::info;

#[derive(Args, Debug)]
pub struct NormalizeCommand {
    /// Extracted-document JSON (`-` for stdin)
    #[arg(short, long)]
    document: PathBuf,
}

#[derive(Debug, Serialize)]
struct NormalizedOutput<'a> {
    income: &'a [IncomeItem],
    deductions: &'a [DeductionItem],
    alerts: &'a [ComplianceAlert],
}

impl NormalizeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let text = super::read_input(&self.document)?;
        let document: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("'{}' is not JSON", self.document.display()))?;

        let normalized = normalize_document(&document);
        info!(
            records = normalized.record_count(),
            alerts = normalized.alerts.len(),
            "normalized document"
        );

        let output = NormalizedOutput {
            income: &normalized.income,
            deductions: &normalized.deductions,
            alerts: &normalized.alerts,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
