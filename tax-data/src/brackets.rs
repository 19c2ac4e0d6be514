//! Rate schedules from CSV.
//!
//! One row per bracket, keyed by IRS schedule letter and table kind:
//!
//! ```text
//! tax_year,schedule,kind,min_income,max_income,rate
//! 2025,X,ordinary,0,11925,0.10
//! 2025,Z,capital_gains,566700,,0.20
//! ```
//!
//! An empty `max_income` marks the open-ended top bracket.

use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{FilingStatus, ProfileError, TaxBracket, TaxYearProfile};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("bad bracket row: {0}")]
    CsvParse(String),

    #[error("unknown rate schedule '{0}' (expected X, Y-1, Y-2 or Z)")]
    InvalidSchedule(String),

    #[error("bracket row is for tax year {found}, profile is for {expected}")]
    TaxYearMismatch { expected: i32, found: i32 },

    #[error("brackets leave the profile invalid: {0}")]
    Profile(#[from] ProfileError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// Schedule letter as printed in the rate tables.
pub fn schedule_to_filing_status(schedule: &str) -> Result<FilingStatus, BracketLoaderError> {
    match schedule.trim() {
        "X" => Ok(FilingStatus::Single),
        "Y-1" => Ok(FilingStatus::MarriedFilingJointly),
        "Y-2" => Ok(FilingStatus::MarriedFilingSeparately),
        "Z" => Ok(FilingStatus::HeadOfHousehold),
        other => Err(BracketLoaderError::InvalidSchedule(other.to_string())),
    }
}

/// Which rate schedule a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketKind {
    Ordinary,
    CapitalGains,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub kind: BracketKind,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub struct BracketLoader;

impl BracketLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        csv::Reader::from_reader(reader)
            .deserialize()
            .map(|row| row.map_err(BracketLoaderError::from))
            .collect()
    }

    /// Overwrites every (kind, status) table that appears in `records`,
    /// leaving the rest of `profile` alone, and returns how many tables
    /// changed. Rows may come in any order. On error `profile` is untouched.
    pub fn apply(
        profile: &mut TaxYearProfile,
        records: &[BracketRecord],
    ) -> Result<usize, BracketLoaderError> {
        let mut groups: BTreeMap<(BracketKind, &'static str), (FilingStatus, Vec<TaxBracket>)> =
            BTreeMap::new();

        for record in records {
            if record.tax_year != profile.tax_year {
                return Err(BracketLoaderError::TaxYearMismatch {
                    expected: profile.tax_year,
                    found: record.tax_year,
                });
            }

            let status = schedule_to_filing_status(&record.schedule)?;
            groups
                .entry((record.kind, status.as_str()))
                .or_insert_with(|| (status, Vec::new()))
                .1
                .push(TaxBracket::new(
                    record.min_income,
                    record.max_income,
                    record.rate,
                ));
        }

        let mut updated = profile.clone();
        let replaced = groups.len();
        for ((kind, _), (status, mut brackets)) in groups {
            brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            debug!(
                kind = ?kind,
                status = %status,
                brackets = brackets.len(),
                "replacing rate schedule"
            );
            let table = match kind {
                BracketKind::Ordinary => &mut updated.ordinary_brackets,
                BracketKind::CapitalGains => &mut updated.capital_gains_brackets,
            };
            *table.get_mut(status) = brackets;
        }

        updated.validate()?;
        *profile = updated;
        Ok(replaced)
    }
}
