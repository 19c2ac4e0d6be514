//! Rounding and flooring shared by every pipeline stage.
//!
//! Stages keep full precision internally and round only the figures they
//! emit: money to cents, rates to four places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds money to cents, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate to four decimal places (`0.1235` = 12.35%).
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_rate;
///
/// assert_eq!(round_rate(dec!(0.123456)), dec!(0.1235));
/// ```
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors at zero. Deductions, credits and taxes never go negative.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}
