//! Alternative minimum tax (Form 6251, simplified).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{AmtLimits, DeductionKind, DeductionSummary, FilingStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmtInput {
    pub filing_status: FilingStatus,
    pub taxable_income: Decimal,
    pub iso_bargain_element: Decimal,
    /// Income taxed at capital gains rates.
    pub preferential_income: Decimal,
    pub preferential_tax: Decimal,
    pub regular_tax: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmtResult {
    pub amti: Decimal,
    pub exemption: Decimal,
    pub tentative_minimum_tax: Decimal,
    pub amt: Decimal,
}

#[derive(Debug, Clone)]
pub struct AmtEngine<'a> {
    limits: &'a AmtLimits,
}

impl<'a> AmtEngine<'a> {
    pub fn new(limits: &'a AmtLimits) -> Self {
        Self { limits }
    }

    pub fn calculate(
        &self,
        input: &AmtInput,
        deductions: &DeductionSummary,
    ) -> AmtResult {
        let status = input.filing_status;

        let amti = round_half_up(
            input.taxable_income + Self::add_back(deductions) + input.iso_bargain_element,
        );
        let exemption = self.exemption(status, amti);
        let base = non_negative(amti - exemption);

        let ordinary_base = base - base.min(input.preferential_income);
        let boundary = *self.limits.rate_boundary.get(status);
        let ordinary_amt = if ordinary_base <= boundary {
            ordinary_base * self.limits.lower_rate
        } else {
            boundary * self.limits.lower_rate
                + (ordinary_base - boundary) * self.limits.upper_rate
        };

        let tentative_minimum_tax = round_half_up(ordinary_amt + input.preferential_tax);
        let amt = non_negative(tentative_minimum_tax - input.regular_tax);

        debug!(
            amti = %amti,
            exemption = %exemption,
            tmt = %tentative_minimum_tax,
            regular_tax = %input.regular_tax,
            amt = %amt,
            "computed alternative minimum tax"
        );

        AmtResult {
            amti,
            exemption,
            tentative_minimum_tax,
            amt,
        }
    }

    /// Deductions AMT does not allow: the standard deduction, or the SALT
    /// deduction claimed when itemizing.
    fn add_back(deductions: &DeductionSummary) -> Decimal {
        match deductions.kind {
            DeductionKind::Standard => deductions.standard,
            DeductionKind::Itemized => deductions.salt_claimed,
        }
    }

    fn exemption(
        &self,
        status: FilingStatus,
        amti: Decimal,
    ) -> Decimal {
        let reduction = self.limits.phaseout_rate
            * non_negative(amti - *self.limits.phaseout_start.get(status));
        round_half_up(non_negative(*self.limits.exemption.get(status) - reduction))
    }
}
