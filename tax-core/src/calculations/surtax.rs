//! Net investment income tax and the additional Medicare tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{FilingStatus, SurtaxLimits};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurtaxInput {
    pub filing_status: FilingStatus,
    /// AGI plus tax-exempt interest.
    pub niit_magi: Decimal,
    /// Passive income net of the allowed passive loss.
    pub net_passive_income: Decimal,
    pub taxable_interest: Decimal,
    pub ordinary_dividends: Decimal,
    /// Realized net capital gain, before the loss limit.
    pub net_capital_gain: Decimal,
    pub medicare_wages: Decimal,
    /// Net earnings from self-employment (Schedule SE line 3).
    pub se_net_earnings: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurtaxResult {
    pub net_investment_income: Decimal,
    pub niit: Decimal,
    pub medicare_surtax: Decimal,
}

#[derive(Debug, Clone)]
pub struct SurtaxEngine<'a> {
    limits: &'a SurtaxLimits,
}

impl<'a> SurtaxEngine<'a> {
    pub fn new(limits: &'a SurtaxLimits) -> Self {
        Self { limits }
    }

    pub fn calculate(
        &self,
        input: &SurtaxInput,
    ) -> SurtaxResult {
        let status = input.filing_status;

        let net_investment_income = round_half_up(non_negative(
            input.net_passive_income
                + input.taxable_interest
                + input.ordinary_dividends
                + non_negative(input.net_capital_gain),
        ));
        let magi_excess = non_negative(input.niit_magi - *self.limits.niit_threshold.get(status));
        let niit = round_half_up(self.limits.niit_rate * net_investment_income.min(magi_excess));

        let medicare_base = input.medicare_wages + non_negative(input.se_net_earnings);
        let medicare_surtax = round_half_up(
            self.limits.medicare_rate
                * non_negative(medicare_base - *self.limits.medicare_threshold.get(status)),
        );

        debug!(
            nii = %net_investment_income,
            magi_excess = %magi_excess,
            niit = %niit,
            medicare_surtax = %medicare_surtax,
            "computed surtaxes"
        );

        SurtaxResult {
            net_investment_income,
            niit,
            medicare_surtax,
        }
    }
}
