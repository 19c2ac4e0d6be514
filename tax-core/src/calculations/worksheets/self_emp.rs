//! Self-employment tax (Schedule SE).
//!
//! Business net income is scaled to net earnings, which owe the full
//! Medicare rate plus the social security rate on whatever part of the wage
//! base W-2 wages left unused. Half the tax comes back as an adjustment to
//! income, and the net earnings join Medicare wages in the Additional
//! Medicare Tax base.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxYearProfile;
//! use tax_core::calculations::SeWorksheet;
//!
//! let profile = TaxYearProfile::tax_year_2025();
//! let se = SeWorksheet::new(&profile.self_employment).calculate(dec!(60000), dec!(0));
//!
//! assert_eq!(se.net_earnings, dec!(55410.00));
//! assert_eq!(se.self_employment_tax, dec!(8477.73));
//! assert_eq!(se.se_tax_deduction, dec!(4238.87));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{non_negative, round_half_up};

/// Schedule SE parameters. Checked by [`crate::TaxYearProfile::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWorksheetConfig {
    /// Social security wage base shared by W-2 wages and SE earnings.
    pub ss_wage_max: Decimal,
    /// Employer plus employee social security rate.
    pub ss_tax_rate: Decimal,
    /// Employer plus employee Medicare rate. No wage base.
    pub medicare_tax_rate: Decimal,
    /// Share of net profit treated as net earnings (the employer-half offset).
    pub net_earnings_factor: Decimal,
    /// Share of the tax deductible as an adjustment.
    pub deduction_factor: Decimal,
    /// Net earnings at or below this owe nothing.
    pub min_se_threshold: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWorksheetResult {
    pub net_earnings: Decimal,
    /// Net earnings that still fit under the social security wage base.
    pub social_security_base: Decimal,
    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub self_employment_tax: Decimal,
    pub se_tax_deduction: Decimal,
    pub below_threshold: bool,
}

impl SeWorksheetResult {
    /// SE earnings counted toward the Additional Medicare Tax.
    pub fn additional_medicare_earnings(&self) -> Decimal {
        if self.below_threshold {
            Decimal::ZERO
        } else {
            self.net_earnings
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeWorksheet<'a> {
    config: &'a SeWorksheetConfig,
}

impl<'a> SeWorksheet<'a> {
    pub fn new(config: &'a SeWorksheetConfig) -> Self {
        Self { config }
    }

    /// `business_income` is the combined net profit of every business;
    /// `ss_wages` the W-2 social security wages already under the base.
    pub fn calculate(
        &self,
        business_income: Decimal,
        ss_wages: Decimal,
    ) -> SeWorksheetResult {
        let net_earnings = round_half_up(business_income * self.config.net_earnings_factor);
        if net_earnings < Decimal::ZERO {
            warn!(
                business_income = %business_income,
                net_earnings = %net_earnings,
                "business loss; no self-employment tax"
            );
        }
        if net_earnings <= self.config.min_se_threshold {
            return SeWorksheetResult {
                net_earnings,
                below_threshold: true,
                ..SeWorksheetResult::default()
            };
        }

        let social_security_base = net_earnings.min(self.unused_wage_base(ss_wages));
        let social_security_tax = round_half_up(social_security_base * self.config.ss_tax_rate);
        let medicare_tax = round_half_up(net_earnings * self.config.medicare_tax_rate);
        let self_employment_tax = social_security_tax + medicare_tax;
        let se_tax_deduction = round_half_up(self_employment_tax * self.config.deduction_factor);

        debug!(
            net_earnings = %net_earnings,
            ss_base = %social_security_base,
            se_tax = %self_employment_tax,
            deduction = %se_tax_deduction,
            "computed self-employment tax"
        );

        SeWorksheetResult {
            net_earnings,
            social_security_base,
            social_security_tax,
            medicare_tax,
            self_employment_tax,
            se_tax_deduction,
            below_threshold: false,
        }
    }

    fn unused_wage_base(
        &self,
        ss_wages: Decimal,
    ) -> Decimal {
        let unused = non_negative(self.config.ss_wage_max - ss_wages);
        if unused.is_zero() {
            debug!(
                ss_wages = %ss_wages,
                wage_base = %self.config.ss_wage_max,
                "wages used the whole social security base"
            );
        }
        unused
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxYearProfile;

    fn worksheet(
        business_income: Decimal,
        ss_wages: Decimal,
    ) -> SeWorksheetResult {
        let profile = TaxYearProfile::tax_year_2025();
        SeWorksheet::new(&profile.self_employment).calculate(business_income, ss_wages)
    }

    /// Routes log output through the test harness for the duration of a test.
    fn capture_logs() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[test]
    fn sole_proprietor_without_wages() {
        let se = worksheet(dec!(100000), dec!(0));

        assert_eq!(se.net_earnings, dec!(92350.00));
        assert_eq!(se.social_security_base, dec!(92350.00));
        assert_eq!(se.social_security_tax, dec!(11451.40));
        assert_eq!(se.medicare_tax, dec!(2678.15));
        assert_eq!(se.self_employment_tax, dec!(14129.55));
        // 7,064.775 rounds up
        assert_eq!(se.se_tax_deduction, dec!(7064.78));
        assert_eq!(se.additional_medicare_earnings(), dec!(92350.00));
    }

    #[test]
    fn side_business_fills_what_wages_left_of_the_base() {
        let se = worksheet(dec!(20000), dec!(170000));

        assert_eq!(se.net_earnings, dec!(18470.00));
        // 176,100 - 170,000
        assert_eq!(se.social_security_base, dec!(6100));
        assert_eq!(se.social_security_tax, dec!(756.40));
        assert_eq!(se.medicare_tax, dec!(535.63));
        assert_eq!(se.self_employment_tax, dec!(1292.03));
        assert_eq!(se.se_tax_deduction, dec!(646.02));
    }

    #[test]
    fn wages_above_the_base_leave_only_medicare() {
        let _logs = capture_logs();

        let se = worksheet(dec!(40000), dec!(250000));

        assert_eq!(se.social_security_base, dec!(0));
        assert_eq!(se.social_security_tax, dec!(0));
        // 36,940 x 2.9%
        assert_eq!(se.self_employment_tax, dec!(1071.26));
    }

    #[test]
    fn large_profit_is_capped_at_the_base() {
        let se = worksheet(dec!(300000), dec!(0));

        assert_eq!(se.net_earnings, dec!(277050.00));
        assert_eq!(se.social_security_base, dec!(176100.00));
        assert_eq!(se.social_security_tax, dec!(21836.40));
        assert_eq!(se.medicare_tax, dec!(8034.45));
    }

    #[test]
    fn earnings_at_the_threshold_owe_nothing() {
        // 433.13 x 92.35% = 400.00
        let se = worksheet(dec!(433.13), dec!(0));

        assert!(se.below_threshold);
        assert_eq!(se.net_earnings, dec!(400.00));
        assert_eq!(se.self_employment_tax, dec!(0));
        assert_eq!(se.additional_medicare_earnings(), dec!(0));
    }

    #[test]
    fn first_dollar_over_the_threshold_is_fully_taxed() {
        // 434 x 92.35% = 400.80
        let se = worksheet(dec!(434), dec!(0));

        assert!(!se.below_threshold);
        assert_eq!(se.self_employment_tax, dec!(61.32));
        assert_eq!(se.se_tax_deduction, dec!(30.66));
    }

    #[test]
    fn business_loss_owes_nothing() {
        let _logs = capture_logs();

        let se = worksheet(dec!(-5000), dec!(40000));

        assert!(se.below_threshold);
        assert_eq!(se.net_earnings, dec!(-4617.50));
        assert_eq!(se.se_tax_deduction, dec!(0));
        assert_eq!(se.additional_medicare_earnings(), dec!(0));
    }
}
