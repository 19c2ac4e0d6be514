//! Qualified business income deduction (Section 199A).

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{AlertCode, ComplianceAlert, FilingStatus, QbiLimits};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QbiInput {
    pub filing_status: FilingStatus,
    pub qbi_income: Decimal,
    pub w2_wages: Decimal,
    pub ubia: Decimal,
    pub sstb: bool,
    pub se_tax_deduction: Decimal,
    /// AGI less the standard or itemized deduction, floored at zero.
    pub tentative_taxable_income: Decimal,
    /// Net long-term capital gain plus qualified dividends.
    pub net_capital_gain: Decimal,
}

#[derive(Debug, Clone)]
pub struct QbiEngine<'a> {
    limits: &'a QbiLimits,
}

impl<'a> QbiEngine<'a> {
    pub fn new(limits: &'a QbiLimits) -> Self {
        Self { limits }
    }

    pub fn calculate(
        &self,
        input: &QbiInput,
        alerts: &mut Vec<ComplianceAlert>,
    ) -> Decimal {
        let base =
            self.limits.rate * non_negative(input.qbi_income - input.se_tax_deduction);
        if base == Decimal::ZERO {
            return Decimal::ZERO;
        }

        let range = self.limits.threshold.get(input.filing_status);
        let taxable = input.tentative_taxable_income;

        let limited = if input.sstb {
            let factor = range.factor(taxable);
            if factor < Decimal::ONE {
                alerts.push(ComplianceAlert::info(
                    AlertCode::SstbLimitation,
                    format!(
                        "Specified service business income limits the QBI deduction to {}% of the base amount",
                        round_half_up(factor * Decimal::ONE_HUNDRED)
                    ),
                ));
            }
            base * factor
        } else if taxable <= range.start {
            base
        } else {
            let wage_limit = self.wage_limit(input.w2_wages, input.ubia);
            if base <= wage_limit {
                base
            } else if taxable >= range.end {
                wage_limit
            } else {
                base - (base - wage_limit) * range.progress(taxable)
            }
        };

        let income_limit =
            self.limits.rate * non_negative(taxable - input.net_capital_gain);
        let deduction = round_half_up(limited.min(income_limit));

        debug!(
            base = %base,
            limited = %limited,
            income_limit = %income_limit,
            deduction = %deduction,
            sstb = input.sstb,
            "computed QBI deduction"
        );

        deduction
    }

    /// Greater of 50% of W-2 wages or 25% of W-2 wages plus 2.5% of UBIA.
    fn wage_limit(
        &self,
        w2_wages: Decimal,
        ubia: Decimal,
    ) -> Decimal {
        let wages_only = self.limits.wage_rate * w2_wages;
        let wages_and_property = self.limits.alt_wage_rate * w2_wages + self.limits.ubia_rate * ubia;
        wages_only.max(wages_and_property)
    }
}
