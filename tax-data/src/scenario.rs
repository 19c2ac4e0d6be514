//! JSON scenario files: a taxpayer plus typed records and, optionally, raw
//! extracted documents that still need normalizing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tax_core::{ComplianceAlert, DeductionItem, IncomeItem, TaxPayer};
use thiserror::Error;

use crate::extraction::normalize_document;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub taxpayer: TaxPayer,
    #[serde(default)]
    pub income: Vec<IncomeItem>,
    #[serde(default)]
    pub deductions: Vec<DeductionItem>,
    /// Raw extraction payloads, normalized and appended to the typed records.
    #[serde(default)]
    pub documents: Vec<Value>,
}

/// Engine-ready inputs built from a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioInputs {
    pub taxpayer: TaxPayer,
    pub income: Vec<IncomeItem>,
    pub deductions: Vec<DeductionItem>,
    /// Alerts raised while normalizing `documents`.
    pub alerts: Vec<ComplianceAlert>,
}

impl Scenario {
    pub fn into_inputs(self) -> ScenarioInputs {
        let mut inputs = ScenarioInputs {
            taxpayer: self.taxpayer,
            income: self.income,
            deductions: self.deductions,
            alerts: Vec::new(),
        };

        for document in &self.documents {
            let normalized = normalize_document(document);
            inputs.income.extend(normalized.income);
            inputs.deductions.extend(normalized.deductions);
            inputs.alerts.extend(normalized.alerts);
        }

        inputs
    }
}

pub fn parse_scenario(text: &str) -> Result<Scenario, ScenarioError> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&text)
}
