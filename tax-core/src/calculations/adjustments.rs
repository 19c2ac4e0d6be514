//! Above-the-line adjustments.
//!
//! Produces the three adjustments that separate gross income from AGI:
//! the deductible half of self-employment tax, HSA contributions and
//! student-loan interest. The student-loan phaseout runs against a MAGI
//! proxy that is also reused by the passive-loss limiter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::worksheets::{SeWorksheet, SeWorksheetConfig, SeWorksheetResult};
use crate::models::{
    AdjustmentLimits, AlertCode, ComplianceAlert, DeductionDetail, DeductionItem, FilingStatus,
    HsaCoverage,
};

const MONTHS_PER_YEAR: u8 = 12;

/// Inputs for the adjustment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustmentInput {
    pub filing_status: FilingStatus,
    pub age_65_or_older: bool,
    /// Combined business net income (Schedule C).
    pub business_income: Decimal,
    /// W-2 social security wages.
    pub ss_wages: Decimal,
    /// Income entering the MAGI proxy before adjustments: wages, taxable
    /// interest, ordinary dividends, business net, allowed capital net, other.
    pub proxy_income: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub self_employment: SeWorksheetResult,
    pub hsa_deduction: Decimal,
    pub hsa_excess: Decimal,
    pub student_loan_interest: Decimal,
    /// MAGI proxy for the student-loan and passive-loss phaseouts.
    pub student_loan_magi: Decimal,
    pub total: Decimal,
}

/// Calculator for the adjustment stage.
#[derive(Debug, Clone)]
pub struct AdjustmentEngine<'a> {
    limits: &'a AdjustmentLimits,
    self_employment: &'a SeWorksheetConfig,
}

impl<'a> AdjustmentEngine<'a> {
    pub fn new(
        limits: &'a AdjustmentLimits,
        self_employment: &'a SeWorksheetConfig,
    ) -> Self {
        Self {
            limits,
            self_employment,
        }
    }

    pub fn calculate(
        &self,
        input: &AdjustmentInput,
        deductions: &[DeductionItem],
        alerts: &mut Vec<ComplianceAlert>,
    ) -> AdjustmentResult {
        let self_employment =
            SeWorksheet::new(self.self_employment).calculate(input.business_income, input.ss_wages);

        let (hsa_deduction, hsa_excess) =
            self.hsa_deduction(input.age_65_or_older, deductions, alerts);

        let student_loan_magi = round_half_up(
            input.proxy_income - self_employment.se_tax_deduction - hsa_deduction,
        );

        let student_loan_interest =
            self.student_loan_interest(input.filing_status, student_loan_magi, deductions, alerts);

        let total =
            round_half_up(self_employment.se_tax_deduction + hsa_deduction + student_loan_interest);

        debug!(
            se_tax = %self_employment.self_employment_tax,
            se_deduction = %self_employment.se_tax_deduction,
            hsa = %hsa_deduction,
            student_loan = %student_loan_interest,
            magi_proxy = %student_loan_magi,
            "computed adjustments"
        );

        AdjustmentResult {
            self_employment,
            hsa_deduction,
            hsa_excess,
            student_loan_interest,
            student_loan_magi,
            total,
        }
    }

    /// Allowed HSA contribution for one record.
    fn hsa_limit(
        &self,
        coverage: HsaCoverage,
        eligible_months: u8,
        age_65_or_older: bool,
    ) -> Decimal {
        let annual = match coverage {
            HsaCoverage::SelfOnly => self.limits.hsa_self_only,
            HsaCoverage::Family => self.limits.hsa_family,
        };
        let months = Decimal::from(eligible_months.min(MONTHS_PER_YEAR));
        let mut limit = annual / Decimal::from(MONTHS_PER_YEAR) * months;
        if age_65_or_older {
            limit += self.limits.hsa_senior_catch_up;
        }
        round_half_up(limit)
    }

    fn hsa_deduction(
        &self,
        age_65_or_older: bool,
        deductions: &[DeductionItem],
        alerts: &mut Vec<ComplianceAlert>,
    ) -> (Decimal, Decimal) {
        let mut allowed_total = Decimal::ZERO;
        let mut excess_total = Decimal::ZERO;

        for item in deductions {
            let DeductionDetail::HsaContribution {
                coverage,
                eligible_months,
            } = &item.detail
            else {
                continue;
            };

            let limit = self.hsa_limit(*coverage, *eligible_months, age_65_or_older);
            let contribution = non_negative(item.amount);
            let allowed = contribution.min(limit);
            let excess = contribution - allowed;

            if excess > Decimal::ZERO {
                alerts.push(ComplianceAlert::warning(
                    AlertCode::HsaExcessContribution,
                    format!(
                        "HSA contribution '{}' of {} exceeds the {} limit by {}",
                        item.id, contribution, limit, excess
                    ),
                ));
            }

            allowed_total += allowed;
            excess_total += excess;
        }

        (round_half_up(allowed_total), round_half_up(excess_total))
    }

    fn student_loan_interest(
        &self,
        filing_status: FilingStatus,
        magi: Decimal,
        deductions: &[DeductionItem],
        alerts: &mut Vec<ComplianceAlert>,
    ) -> Decimal {
        let capped: Decimal = deductions
            .iter()
            .filter(|item| matches!(item.detail, DeductionDetail::StudentLoanInterest))
            .map(|item| non_negative(item.amount).min(self.limits.student_loan_interest_cap))
            .sum();

        if capped == Decimal::ZERO {
            return Decimal::ZERO;
        }

        if filing_status == FilingStatus::MarriedFilingSeparately {
            alerts.push(ComplianceAlert::info(
                AlertCode::StudentLoanFilingStatus,
                format!(
                    "Student loan interest of {capped} is not deductible when married filing separately"
                ),
            ));
            return Decimal::ZERO;
        }

        let factor = self.limits.student_loan_phaseout.get(filing_status).factor(magi);
        round_half_up(capped * factor)
    }
}
