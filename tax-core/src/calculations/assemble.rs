//! Final liability, payments and the refund or balance due.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up, round_rate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiabilityInput {
    pub gross_income: Decimal,
    pub regular_tax: Decimal,
    pub amt: Decimal,
    pub se_tax: Decimal,
    pub niit: Decimal,
    pub medicare_surtax: Decimal,
    pub nonrefundable_credits: Decimal,
    pub refundable_credits: Decimal,
    pub withholding: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub total_liability: Decimal,
    pub total_payments: Decimal,
    pub refund: Decimal,
    pub amount_due: Decimal,
    pub effective_rate: Decimal,
}

/// Settles the liability against payments and refundable credits.
///
/// Exactly one of `refund` and `amount_due` is nonzero, or both are zero
/// when payments match the liability.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::assemble::{settle, LiabilityInput};
///
/// let settlement = settle(&LiabilityInput {
///     gross_income: dec!(60000),
///     regular_tax: dec!(5089.50),
///     withholding: dec!(6000),
///     ..LiabilityInput::default()
/// });
///
/// assert_eq!(settlement.refund, dec!(910.50));
/// assert_eq!(settlement.amount_due, dec!(0));
/// assert_eq!(settlement.effective_rate, dec!(0.0848));
/// ```
pub fn settle(input: &LiabilityInput) -> Settlement {
    let total_liability = round_half_up(non_negative(
        input.regular_tax + input.amt + input.se_tax + input.niit + input.medicare_surtax
            - input.nonrefundable_credits,
    ));
    let total_payments = round_half_up(input.withholding);

    let net = total_payments + input.refundable_credits - total_liability;
    let (refund, amount_due) = if net > Decimal::ZERO {
        (round_half_up(net), Decimal::ZERO)
    } else {
        (Decimal::ZERO, round_half_up(-net))
    };

    let effective_rate = if input.gross_income > Decimal::ZERO {
        round_rate(total_liability / input.gross_income)
    } else {
        Decimal::ZERO
    };

    debug!(
        liability = %total_liability,
        payments = %total_payments,
        refund = %refund,
        amount_due = %amount_due,
        "settled return"
    );

    Settlement {
        total_liability,
        total_payments,
        refund,
        amount_due,
        effective_rate,
    }
}
