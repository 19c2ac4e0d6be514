use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaltKind {
    Income,
    Sales,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HsaCoverage {
    SelfOnly,
    Family,
}

/// Category-specific payload of a [`DeductionItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum DeductionDetail {
    MortgageInterest {
        #[serde(default)]
        origination_date: Option<NaiveDate>,
        /// Outstanding acquisition debt, used for the debt-limit test.
        #[serde(default)]
        balance: Decimal,
    },
    StateLocalTax {
        kind: SaltKind,
    },
    Charity {
        #[serde(default = "default_true")]
        cash: bool,
    },
    Medical,
    HsaContribution {
        coverage: HsaCoverage,
        #[serde(default = "default_months")]
        eligible_months: u8,
    },
    StudentLoanInterest,
    Tuition {
        #[serde(default)]
        student: String,
        #[serde(default)]
        half_time: bool,
        #[serde(default)]
        first_four_years: bool,
        #[serde(default)]
        drug_conviction: bool,
    },
    EnergyImprovement,
    Adoption,
}

fn default_true() -> bool {
    true
}

fn default_months() -> u8 {
    12
}

/// A deductible expense or credit-eligible expense record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionItem {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    pub detail: DeductionDetail,
}

impl DeductionItem {
    pub fn new(
        id: impl Into<String>,
        amount: Decimal,
        detail: DeductionDetail,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            amount,
            detail,
        }
    }
}
