//! Regular income tax from the rate schedules.
//!
//! Ordinary income runs through the ordinary brackets. Long-term gain and
//! qualified dividends stack on top of ordinary income against the capital
//! gains brackets. Unrecaptured Section 1250 gain and collectibles gain stay
//! in the ordinary base but are never taxed above their capped rates.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::progressive::{ProgressiveTaxCalculator, TaxableIncomeInput};
//! use tax_core::{FilingStatus, TaxYearProfile};
//!
//! let profile = TaxYearProfile::tax_year_2025();
//! let calculator = ProgressiveTaxCalculator::new(&profile, FilingStatus::Single);
//!
//! let result = calculator.calculate(&TaxableIncomeInput {
//!     taxable_income: dec!(44400),
//!     ..TaxableIncomeInput::default()
//! });
//!
//! assert_eq!(result.regular_tax, dec!(5089.50));
//! assert_eq!(result.marginal_rate, dec!(0.12));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{
    CapitalGainLimits, FilingStatus, TaxBracket, TaxYearProfile, TaxableIncomeBreakdown,
};

/// Sum of each band's share of `income` times its rate (unrounded).
pub fn bracket_tax(
    brackets: &[TaxBracket],
    income: Decimal,
) -> Decimal {
    if income <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    brackets
        .iter()
        .map(|bracket| bracket.span_of(income) * bracket.rate)
        .sum()
}

/// Rate of the highest band `income` reaches; zero when nothing is taxed.
pub fn marginal_rate(
    brackets: &[TaxBracket],
    income: Decimal,
) -> Decimal {
    brackets
        .iter()
        .rev()
        .find(|bracket| bracket.span_of(income) > Decimal::ZERO)
        .map_or(Decimal::ZERO, |bracket| bracket.rate)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxableIncomeInput {
    pub taxable_income: Decimal,
    pub qualified_dividends: Decimal,
    /// Long-term gain eligible for 0/15/20% rates after netting.
    pub long_term_gain: Decimal,
    pub unrecaptured_1250_gain: Decimal,
    pub collectibles_gain: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveTaxResult {
    pub taxable: TaxableIncomeBreakdown,
    pub ordinary_tax: Decimal,
    pub preferential_tax: Decimal,
    pub regular_tax: Decimal,
    pub marginal_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct ProgressiveTaxCalculator<'a> {
    ordinary: &'a [TaxBracket],
    capital_gains: &'a [TaxBracket],
    capped_rates: &'a CapitalGainLimits,
}

impl<'a> ProgressiveTaxCalculator<'a> {
    pub fn new(
        profile: &'a TaxYearProfile,
        filing_status: FilingStatus,
    ) -> Self {
        Self {
            ordinary: profile.ordinary_brackets.get(filing_status),
            capital_gains: profile.capital_gains_brackets.get(filing_status),
            capped_rates: &profile.capital_gains,
        }
    }

    pub fn calculate(
        &self,
        input: &TaxableIncomeInput,
    ) -> ProgressiveTaxResult {
        let taxable = self.split(input);

        let ordinary_tax = self.ordinary_tax(&taxable);
        let preferential_tax = self.preferential_tax(taxable.ordinary, taxable.long_term_gain);
        let regular_tax = round_half_up(ordinary_tax + preferential_tax);
        let marginal_rate = marginal_rate(self.ordinary, taxable.ordinary);

        debug!(
            taxable = %taxable.total,
            ordinary = %taxable.ordinary,
            preferential = %taxable.long_term_gain,
            ordinary_tax = %ordinary_tax,
            preferential_tax = %preferential_tax,
            marginal_rate = %marginal_rate,
            "computed regular tax"
        );

        ProgressiveTaxResult {
            taxable,
            ordinary_tax,
            preferential_tax,
            regular_tax,
            marginal_rate,
        }
    }

    fn split(
        &self,
        input: &TaxableIncomeInput,
    ) -> TaxableIncomeBreakdown {
        let total = non_negative(input.taxable_income);
        let preferential = total.min(
            non_negative(input.long_term_gain) + non_negative(input.qualified_dividends),
        );
        let ordinary = total - preferential;

        let unrecaptured_1250 = ordinary.min(non_negative(input.unrecaptured_1250_gain));
        let collectibles =
            (ordinary - unrecaptured_1250).min(non_negative(input.collectibles_gain));

        TaxableIncomeBreakdown {
            total,
            ordinary,
            long_term_gain: preferential,
            unrecaptured_1250,
            collectibles,
        }
    }

    /// Bracket tax on the ordinary base, limited by the capped-rate
    /// computation for Section 1250 and collectibles gain.
    fn ordinary_tax(
        &self,
        taxable: &TaxableIncomeBreakdown,
    ) -> Decimal {
        let full = bracket_tax(self.ordinary, taxable.ordinary);

        let special = taxable.unrecaptured_1250 + taxable.collectibles;
        if special == Decimal::ZERO {
            return round_half_up(full);
        }

        let capped = bracket_tax(self.ordinary, taxable.ordinary - special)
            + taxable.unrecaptured_1250 * self.capped_rates.unrecaptured_1250_rate
            + taxable.collectibles * self.capped_rates.collectibles_rate;

        round_half_up(full.min(capped))
    }

    /// Capital gains bracket tax on `preferential` stacked above `ordinary`.
    fn preferential_tax(
        &self,
        ordinary: Decimal,
        preferential: Decimal,
    ) -> Decimal {
        if preferential <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let top = ordinary + preferential;
        let tax: Decimal = self
            .capital_gains
            .iter()
            .map(|bracket| (bracket.span_of(top) - bracket.span_of(ordinary)) * bracket.rate)
            .sum();
        round_half_up(tax)
    }
}
