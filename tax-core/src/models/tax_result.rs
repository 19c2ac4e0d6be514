use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ComplianceAlert;

/// The three modified-AGI variants used by different limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagiVariants {
    /// AGI plus tax-exempt interest.
    pub niit: Decimal,
    /// AGI with the student-loan interest deduction added back.
    pub roth: Decimal,
    /// Pre-passive income proxy used for the student-loan and passive-loss phaseouts.
    pub student_loan: Decimal,
}

/// Category totals that make up gross income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSummary {
    pub wages: Decimal,
    pub taxable_interest: Decimal,
    pub tax_exempt_interest: Decimal,
    pub ordinary_dividends: Decimal,
    pub qualified_dividends: Decimal,
    /// Net capital gain or the allowed capital loss (never below the loss limit).
    pub capital_gain: Decimal,
    pub business_income: Decimal,
    /// Passive income net of the allowed passive loss.
    pub passive_income: Decimal,
    pub other_income: Decimal,
    pub social_security_benefits: Decimal,
    pub taxable_social_security: Decimal,
    pub iso_bargain_element: Decimal,
}

impl IncomeSummary {
    /// Sum of every component that enters gross income.
    pub fn gross_income(&self) -> Decimal {
        self.wages
            + self.taxable_interest
            + self.ordinary_dividends
            + self.capital_gain
            + self.business_income
            + self.passive_income
            + self.other_income
            + self.taxable_social_security
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSummary {
    pub se_tax_deduction: Decimal,
    pub hsa_deduction: Decimal,
    pub student_loan_interest: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    #[default]
    Standard,
    Itemized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSummary {
    pub standard: Decimal,
    pub itemized: Decimal,
    pub used: Decimal,
    pub kind: DeductionKind,
    pub mortgage_interest: Decimal,
    pub charitable: Decimal,
    pub medical: Decimal,
    /// SALT deduction actually claimed (after the cap).
    pub salt_claimed: Decimal,
    /// SALT paid above the cap.
    pub salt_disallowed: Decimal,
    pub qbi: Decimal,
}

/// Taxable income split by rate class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxableIncomeBreakdown {
    pub total: Decimal,
    pub ordinary: Decimal,
    /// Long-term gain plus qualified dividends taxed at preferential rates.
    pub long_term_gain: Decimal,
    pub unrecaptured_1250: Decimal,
    pub collectibles: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAmount {
    pub nonrefundable: Decimal,
    pub refundable: Decimal,
}

impl CreditAmount {
    pub fn total(&self) -> Decimal {
        self.nonrefundable + self.refundable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub child_tax_credit: CreditAmount,
    pub other_dependent_credit: CreditAmount,
    pub earned_income_credit: CreditAmount,
    pub american_opportunity_credit: CreditAmount,
    pub energy_credit: CreditAmount,
    pub adoption_credit: CreditAmount,
    pub total_nonrefundable: Decimal,
    pub total_refundable: Decimal,
}

/// Amounts that roll into the next tax year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverSnapshot {
    pub suspended_passive_losses: BTreeMap<String, Decimal>,
    pub capital_loss: Decimal,
    pub charitable_contributions: Decimal,
}

/// Complete output of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub gross_income: Decimal,
    pub agi: Decimal,
    pub magi: MagiVariants,
    pub income: IncomeSummary,
    pub adjustments: AdjustmentSummary,
    pub deductions: DeductionSummary,
    pub taxable: TaxableIncomeBreakdown,
    pub ordinary_tax: Decimal,
    pub preferential_tax: Decimal,
    pub regular_tax: Decimal,
    pub amt: Decimal,
    pub se_tax: Decimal,
    pub niit: Decimal,
    pub medicare_surtax: Decimal,
    pub credits: CreditSummary,
    pub total_liability: Decimal,
    pub total_payments: Decimal,
    pub refund: Decimal,
    pub amount_due: Decimal,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub alerts: Vec<ComplianceAlert>,
    pub carryover: CarryoverSnapshot,
}
