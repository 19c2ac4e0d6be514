//! The liability pipeline.
//!
//! [`TaxEngine`] owns a validated [`TaxYearProfile`] and runs every
//! calculation stage over one return. It never fails on tax input: degraded
//! or ineligible input shows up as [`ComplianceAlert`]s on the result.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::{FilingStatus, IncomeItem, TaxEngine, TaxPayer, TaxYearProfile};
//!
//! let engine = TaxEngine::new(TaxYearProfile::tax_year_2025()).unwrap();
//! let result = engine.compute(
//!     &TaxPayer::new(FilingStatus::Single),
//!     &[IncomeItem::wage("w2", dec!(60000)).with_withholding(dec!(6000))],
//!     &[],
//! );
//!
//! assert_eq!(result.taxable.total, dec!(44400));
//! assert_eq!(result.regular_tax, dec!(5089.50));
//! assert_eq!(result.refund, dec!(910.50));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::adjustments::{AdjustmentEngine, AdjustmentInput};
use crate::calculations::amt::{AmtEngine, AmtInput};
use crate::calculations::assemble::{LiabilityInput, settle};
use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::credits::{CreditEngine, CreditInput};
use crate::calculations::deductions::{DeductionSelector, taxable_social_security};
use crate::calculations::income::{IncomeClassifier, split_capital_gains};
use crate::calculations::passive::PassiveLossLimiter;
use crate::calculations::progressive::{ProgressiveTaxCalculator, TaxableIncomeInput};
use crate::calculations::qbi::{QbiEngine, QbiInput};
use crate::calculations::surtax::{SurtaxEngine, SurtaxInput};
use crate::models::{
    AdjustmentSummary, AlertCode, CarryoverSnapshot, ComplianceAlert, DeductionItem,
    IncomeItem, IncomeSummary, MagiVariants, ProfileError, TaxPayer, TaxResult, TaxYearProfile,
};

/// Federal liability engine bound to one tax year's parameters.
#[derive(Debug, Clone)]
pub struct TaxEngine {
    profile: TaxYearProfile,
}

impl TaxEngine {
    /// Creates an engine after checking the profile is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] if any schedule, rate or range is malformed.
    pub fn new(profile: TaxYearProfile) -> Result<Self, ProfileError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &TaxYearProfile {
        &self.profile
    }

    /// Computes the full liability for one return.
    pub fn compute(
        &self,
        taxpayer: &TaxPayer,
        income: &[IncomeItem],
        deductions: &[DeductionItem],
    ) -> TaxResult {
        let profile = &self.profile;
        let status = taxpayer.filing_status;
        let mut alerts = Vec::new();

        // Income classification
        let totals =
            IncomeClassifier::new(profile.wash_sale_treatment).classify(income, &mut alerts);
        let capital = split_capital_gains(&totals, *profile.capital_gains.loss_limit.get(status));
        if capital.carryover > Decimal::ZERO {
            alerts.push(ComplianceAlert::info(
                AlertCode::CapitalLossCarryover,
                format!(
                    "Net capital loss exceeds the {} annual limit; {} carries forward",
                    profile.capital_gains.loss_limit.get(status),
                    capital.carryover
                ),
            ));
        }

        // Adjustments
        let proxy_income = totals.wages
            + totals.taxable_interest
            + totals.ordinary_dividends
            + totals.business_income
            + capital.allowed
            + totals.other_income;
        let adjustments = AdjustmentEngine::new(&profile.adjustments, &profile.self_employment)
            .calculate(
                &AdjustmentInput {
                    filing_status: status,
                    age_65_or_older: taxpayer.age_65_or_older,
                    business_income: totals.business_income,
                    ss_wages: totals.ss_wages,
                    proxy_income,
                },
                deductions,
                &mut alerts,
            );

        // Passive losses
        let passive = PassiveLossLimiter::new(&profile.passive).calculate(
            status,
            totals.passive_income,
            &totals.passive_losses,
            adjustments.student_loan_magi,
            &mut alerts,
        );

        // Gross income and AGI
        let mut summary = IncomeSummary {
            wages: totals.wages,
            taxable_interest: totals.taxable_interest,
            tax_exempt_interest: totals.tax_exempt_interest,
            ordinary_dividends: totals.ordinary_dividends,
            qualified_dividends: totals.qualified_dividends,
            capital_gain: capital.allowed,
            business_income: totals.business_income,
            passive_income: passive.net_passive_income,
            other_income: totals.other_income,
            social_security_benefits: totals.social_security_benefits,
            taxable_social_security: Decimal::ZERO,
            iso_bargain_element: totals.iso_bargain_element,
        };
        summary.taxable_social_security = taxable_social_security(
            &profile.social_security,
            status,
            totals.social_security_benefits,
            summary.gross_income() - adjustments.total,
            totals.tax_exempt_interest,
        );
        let gross_income = round_half_up(summary.gross_income());
        let agi = non_negative(round_half_up(gross_income - adjustments.total));

        // Deductions
        let mut selected =
            DeductionSelector::new(&profile.deductions).calculate(taxpayer, deductions, agi, &mut alerts);
        let tentative_taxable_income = non_negative(agi - selected.summary.used);

        selected.summary.qbi = QbiEngine::new(&profile.qbi).calculate(
            &QbiInput {
                filing_status: status,
                qbi_income: totals.qbi_income,
                w2_wages: totals.qbi_w2_wages,
                ubia: totals.qbi_ubia,
                sstb: totals.sstb,
                se_tax_deduction: adjustments.self_employment.se_tax_deduction,
                tentative_taxable_income,
                net_capital_gain: capital.net_capital_gain() + totals.qualified_dividends,
            },
            &mut alerts,
        );
        let taxable_income =
            round_half_up(non_negative(tentative_taxable_income - selected.summary.qbi));

        // Regular tax and AMT
        let progressive = ProgressiveTaxCalculator::new(profile, status).calculate(
            &TaxableIncomeInput {
                taxable_income,
                qualified_dividends: totals.qualified_dividends,
                long_term_gain: capital.long_term,
                unrecaptured_1250_gain: capital.unrecaptured_1250,
                collectibles_gain: capital.collectibles,
            },
        );
        let amt = AmtEngine::new(&profile.amt).calculate(
            &AmtInput {
                filing_status: status,
                taxable_income,
                iso_bargain_element: totals.iso_bargain_element,
                preferential_income: progressive.taxable.long_term_gain,
                preferential_tax: progressive.preferential_tax,
                regular_tax: progressive.regular_tax,
            },
            &selected.summary,
        );

        // Credits
        let se_deduction = adjustments.self_employment.se_tax_deduction;
        let earned_income =
            round_half_up(totals.wages + non_negative(totals.business_income - se_deduction));
        let credits = CreditEngine::new(&profile.credits).calculate(
            taxpayer,
            deductions,
            &CreditInput {
                agi,
                earned_income,
                investment_income: totals.investment_income,
                income_tax: progressive.regular_tax + amt.amt,
            },
            &mut alerts,
        );

        // Surtaxes
        let niit_magi = round_half_up(agi + totals.tax_exempt_interest);
        let se = &adjustments.self_employment;
        let surtax = SurtaxEngine::new(&profile.surtax).calculate(&SurtaxInput {
            filing_status: status,
            niit_magi,
            net_passive_income: passive.net_passive_income,
            taxable_interest: totals.taxable_interest,
            ordinary_dividends: totals.ordinary_dividends,
            net_capital_gain: totals.net_capital(),
            medicare_wages: totals.medicare_wages,
            se_net_earnings: se.additional_medicare_earnings(),
        });

        // Settlement
        let settlement = settle(&LiabilityInput {
            gross_income,
            regular_tax: progressive.regular_tax,
            amt: amt.amt,
            se_tax: se.self_employment_tax,
            niit: surtax.niit,
            medicare_surtax: surtax.medicare_surtax,
            nonrefundable_credits: credits.total_nonrefundable,
            refundable_credits: credits.total_refundable,
            withholding: totals.withholding,
        });

        debug!(
            status = %status,
            gross = %gross_income,
            agi = %agi,
            taxable = %taxable_income,
            liability = %settlement.total_liability,
            refund = %settlement.refund,
            amount_due = %settlement.amount_due,
            alerts = alerts.len(),
            "computed return"
        );

        TaxResult {
            gross_income,
            agi,
            magi: MagiVariants {
                niit: niit_magi,
                roth: round_half_up(agi + adjustments.student_loan_interest),
                student_loan: adjustments.student_loan_magi,
            },
            income: summary,
            adjustments: AdjustmentSummary {
                se_tax_deduction: se_deduction,
                hsa_deduction: adjustments.hsa_deduction,
                student_loan_interest: adjustments.student_loan_interest,
                total: adjustments.total,
            },
            deductions: selected.summary,
            taxable: progressive.taxable,
            ordinary_tax: progressive.ordinary_tax,
            preferential_tax: progressive.preferential_tax,
            regular_tax: progressive.regular_tax,
            amt: amt.amt,
            se_tax: se.self_employment_tax,
            niit: surtax.niit,
            medicare_surtax: surtax.medicare_surtax,
            credits,
            total_liability: settlement.total_liability,
            total_payments: settlement.total_payments,
            refund: settlement.refund,
            amount_due: settlement.amount_due,
            effective_rate: settlement.effective_rate,
            marginal_rate: progressive.marginal_rate,
            alerts,
            carryover: CarryoverSnapshot {
                suspended_passive_losses: passive.suspended_by_property,
                capital_loss: capital.carryover,
                charitable_contributions: selected.charitable_carryover,
            },
        }
    }
}

impl Default for TaxEngine {
    /// Engine using the built-in 2025 parameters.
    fn default() -> Self {
        Self {
            profile: TaxYearProfile::tax_year_2025(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{FilingStatus, HoldingPeriod, IncomeDetail, Severity, StatusTable};

    fn single() -> TaxPayer {
        TaxPayer::new(FilingStatus::Single)
    }

    #[test]
    fn rejects_invalid_profile() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.ordinary_brackets = StatusTable::uniform(Vec::new());

        let result = TaxEngine::new(profile);

        assert!(matches!(result, Err(ProfileError::EmptySchedule { .. })));
    }

    #[test]
    fn rejects_profile_with_zero_credit_step() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.credits.child.step = dec!(0);

        let result = TaxEngine::new(profile);

        assert!(matches!(
            result,
            Err(ProfileError::InvalidLimit { bound: "positive", .. })
        ));
    }

    #[test]
    fn default_engine_uses_built_in_profile() {
        let engine = TaxEngine::default();

        assert_eq!(engine.profile().tax_year, 2025);
        assert!(engine.profile().validate().is_ok());
    }

    #[test]
    fn empty_return_is_all_zero() {
        let result = TaxEngine::default().compute(&single(), &[], &[]);

        assert_eq!(result.gross_income, dec!(0));
        assert_eq!(result.total_liability, dec!(0));
        assert_eq!(result.refund, dec!(0));
        assert_eq!(result.amount_due, dec!(0));
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn capital_loss_limited_with_carryover_alert() {
        let income = [
            IncomeItem::wage("w2", dec!(50000)),
            IncomeItem::new(
                "brokerage",
                dec!(2000),
                IncomeDetail::CapitalGain {
                    cost_basis: dec!(12000),
                    holding: HoldingPeriod::LongTerm,
                    wash_sale_loss_disallowed: false,
                },
            ),
        ];

        let result = TaxEngine::default().compute(&single(), &income, &[]);

        assert_eq!(result.income.capital_gain, dec!(-3000));
        assert_eq!(result.gross_income, dec!(47000));
        assert_eq!(result.carryover.capital_loss, dec!(7000));
        assert!(result.alerts.iter().any(|alert| {
            alert.code == AlertCode::CapitalLossCarryover && alert.severity == Severity::Info
        }));
    }

    #[test]
    fn self_employment_flows_through_every_stage() {
        let income = [IncomeItem::new(
            "schedule-c",
            dec!(100000),
            IncomeDetail::Business {
                expenses: dec!(0),
                w2_wages: dec!(0),
                ubia: dec!(0),
                sstb: false,
            },
        )];

        let result = TaxEngine::default().compute(&single(), &income, &[]);

        // 100,000 x 92.35% = 92,350; 15.3% SE tax
        assert_eq!(result.se_tax, dec!(14129.55));
        assert_eq!(result.adjustments.se_tax_deduction, dec!(7064.78));
        assert_eq!(result.agi, dec!(92935.22));
        // 20% x (100,000 - 7,064.78) capped at 20% x 77,335.22
        assert_eq!(result.deductions.qbi, dec!(15467.04));
        assert_eq!(result.taxable.total, dec!(61868.18));
    }

    #[test]
    fn magi_variants_reported() {
        let income = [
            IncomeItem::wage("w2", dec!(70000)),
            IncomeItem::new("muni", dec!(1500), IncomeDetail::Interest { tax_exempt: true }),
        ];
        let deductions = [DeductionItem::new(
            "1098-e",
            dec!(1000),
            crate::models::DeductionDetail::StudentLoanInterest,
        )];

        let result = TaxEngine::default().compute(&single(), &income, &deductions);

        assert_eq!(result.agi, dec!(69000));
        assert_eq!(result.magi.niit, dec!(70500));
        assert_eq!(result.magi.roth, dec!(70000));
        assert_eq!(result.magi.student_loan, dec!(70000));
    }
}
