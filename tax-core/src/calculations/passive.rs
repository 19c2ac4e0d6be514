//! Passive activity loss limits (rental real estate).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::income::PassiveLoss;
use crate::models::{AlertCode, ComplianceAlert, FilingStatus, PassiveLossLimits};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveLossResult {
    pub total_loss: Decimal,
    pub allowed_loss: Decimal,
    pub suspended_loss: Decimal,
    /// Suspended loss carried forward per property.
    pub suspended_by_property: BTreeMap<String, Decimal>,
    /// Passive income less the allowed loss; may be negative.
    pub net_passive_income: Decimal,
}

#[derive(Debug, Clone)]
pub struct PassiveLossLimiter<'a> {
    limits: &'a PassiveLossLimits,
}

impl<'a> PassiveLossLimiter<'a> {
    pub fn new(limits: &'a PassiveLossLimits) -> Self {
        Self { limits }
    }

    /// Applies the passive loss rules.
    ///
    /// `magi` is the pre-passive income proxy produced by the adjustment
    /// stage.
    pub fn calculate(
        &self,
        filing_status: FilingStatus,
        passive_income: Decimal,
        losses: &[PassiveLoss],
        magi: Decimal,
        alerts: &mut Vec<ComplianceAlert>,
    ) -> PassiveLossResult {
        let by_property = merge_by_property(losses);
        let total_loss: Decimal = by_property.values().map(|(amount, _)| *amount).sum();
        let income = non_negative(passive_income);

        if income >= total_loss {
            return PassiveLossResult {
                total_loss,
                allowed_loss: total_loss,
                net_passive_income: round_half_up(passive_income - total_loss),
                ..PassiveLossResult::default()
            };
        }

        let allowance = self.special_allowance(filing_status, magi);

        // Passive income absorbs losses without active participation first
        let active_loss: Decimal = by_property
            .values()
            .filter(|(_, active)| *active)
            .map(|(amount, _)| *amount)
            .sum();
        let excess = total_loss - income;
        let active_excess = excess.min(active_loss);

        let allowed_loss = round_half_up(income + allowance.min(active_excess));
        let suspended_loss = total_loss - allowed_loss;
        let suspended_by_property = allocate_suspended(&by_property, total_loss, suspended_loss);

        debug!(
            total_loss = %total_loss,
            allowance = %allowance,
            magi = %magi,
            allowed = %allowed_loss,
            suspended = %suspended_loss,
            "limited passive losses"
        );

        if suspended_loss > Decimal::ZERO {
            alerts.push(ComplianceAlert::warning(
                AlertCode::PassiveLossSuspended,
                format!(
                    "Passive losses of {suspended_loss} suspended and carried forward across {} properties",
                    suspended_by_property.len()
                ),
            ));
        }

        PassiveLossResult {
            total_loss,
            allowed_loss,
            suspended_loss,
            suspended_by_property,
            net_passive_income: round_half_up(passive_income - allowed_loss),
        }
    }

    /// Special allowance for actively managed rental real estate.
    fn special_allowance(
        &self,
        filing_status: FilingStatus,
        magi: Decimal,
    ) -> Decimal {
        if filing_status == FilingStatus::MarriedFilingSeparately {
            return Decimal::ZERO;
        }

        let reduction =
            self.limits.reduction_rate * non_negative(magi - self.limits.phaseout_start);
        round_half_up(non_negative(self.limits.special_allowance - reduction))
    }
}

/// Sums losses per property; a property counts as active if any record is.
fn merge_by_property(losses: &[PassiveLoss]) -> BTreeMap<String, (Decimal, bool)> {
    let mut merged: BTreeMap<String, (Decimal, bool)> = BTreeMap::new();
    for loss in losses {
        let entry = merged
            .entry(loss.property_id.clone())
            .or_insert((Decimal::ZERO, false));
        entry.0 += loss.amount;
        entry.1 |= loss.active_participation;
    }
    merged
}

/// Splits `suspended` pro rata by each property's share of `total_loss`.
/// The rounding remainder lands on the largest-loss property so the shares
/// sum exactly.
fn allocate_suspended(
    by_property: &BTreeMap<String, (Decimal, bool)>,
    total_loss: Decimal,
    suspended: Decimal,
) -> BTreeMap<String, Decimal> {
    let mut shares = BTreeMap::new();
    if suspended <= Decimal::ZERO || total_loss <= Decimal::ZERO {
        return shares;
    }

    for (property, (amount, _)) in by_property {
        shares.insert(
            property.clone(),
            round_half_up(suspended * *amount / total_loss),
        );
    }

    let allocated: Decimal = shares.values().copied().sum();
    let remainder = suspended - allocated;
    if remainder != Decimal::ZERO {
        let largest = by_property
            .iter()
            .max_by(|(_, (a, _)), (_, (b, _))| a.cmp(b))
            .map(|(property, _)| property.clone());
        if let Some(share) = largest.and_then(|property| shares.get_mut(&property)) {
            *share += remainder;
        }
    }

    shares
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Severity, TaxYearProfile};

    fn loss(
        property: &str,
        amount: Decimal,
        active: bool,
    ) -> PassiveLoss {
        PassiveLoss {
            property_id: property.to_string(),
            amount,
            active_participation: active,
        }
    }

    fn limit(
        status: FilingStatus,
        income: Decimal,
        losses: &[PassiveLoss],
        magi: Decimal,
    ) -> (PassiveLossResult, Vec<ComplianceAlert>) {
        let profile = TaxYearProfile::tax_year_2025();
        let mut alerts = Vec::new();
        let result = PassiveLossLimiter::new(&profile.passive)
            .calculate(status, income, losses, magi, &mut alerts);
        (result, alerts)
    }

    #[test]
    fn income_covers_losses_nothing_suspended() {
        let losses = [loss("condo", dec!(4000), false)];

        let (result, alerts) = limit(FilingStatus::Single, dec!(6000), &losses, dec!(500000));

        assert_eq!(result.allowed_loss, dec!(4000));
        assert_eq!(result.suspended_loss, dec!(0));
        assert_eq!(result.net_passive_income, dec!(2000));
        assert!(result.suspended_by_property.is_empty());
        assert!(alerts.is_empty());
    }

    #[test]
    fn full_allowance_below_phaseout() {
        let losses = [loss("condo", dec!(20000), true)];

        let (result, _) = limit(FilingStatus::Single, dec!(0), &losses, dec!(80000));

        assert_eq!(result.allowed_loss, dec!(20000));
        assert_eq!(result.net_passive_income, dec!(-20000));
    }

    #[test]
    fn allowance_reduced_by_half_of_excess_magi() {
        let losses = [loss("condo", dec!(30000), true)];

        // 25,000 - 50% x (120,000 - 100,000) = 15,000
        let (result, alerts) = limit(FilingStatus::Single, dec!(5000), &losses, dec!(120000));

        assert_eq!(result.allowed_loss, dec!(20000));
        assert_eq!(result.suspended_loss, dec!(10000));
        assert_eq!(alerts[0].code, AlertCode::PassiveLossSuspended);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn no_allowance_for_married_separate() {
        let losses = [loss("condo", dec!(8000), true)];

        let (result, _) = limit(
            FilingStatus::MarriedFilingSeparately,
            dec!(1000),
            &losses,
            dec!(40000),
        );

        assert_eq!(result.allowed_loss, dec!(1000));
        assert_eq!(result.suspended_loss, dec!(7000));
    }

    #[test]
    fn allowance_only_offsets_active_participation() {
        let losses = [loss("fund", dec!(10000), false), loss("duplex", dec!(6000), true)];

        let (result, _) = limit(FilingStatus::Single, dec!(0), &losses, dec!(50000));

        assert_eq!(result.allowed_loss, dec!(6000));
        assert_eq!(result.suspended_loss, dec!(10000));
    }

    #[test]
    fn suspended_loss_allocated_pro_rata() {
        let losses = [
            loss("a", dec!(10000), false),
            loss("b", dec!(20000), false),
            loss("c", dec!(30000), false),
        ];

        let (result, _) = limit(FilingStatus::Single, dec!(0), &losses, dec!(50000));

        assert_eq!(result.suspended_loss, dec!(60000));
        assert_eq!(result.suspended_by_property["a"], dec!(10000));
        assert_eq!(result.suspended_by_property["b"], dec!(20000));
        assert_eq!(result.suspended_by_property["c"], dec!(30000));
    }

    #[test]
    fn allocation_remainder_goes_to_largest_loss() {
        let losses = [
            loss("a", dec!(100), false),
            loss("b", dec!(100), false),
            loss("c", dec!(200), false),
        ];

        // 100 suspended across 100/100/200: 25 / 25 / 50
        let (result, _) = limit(FilingStatus::Single, dec!(300), &losses, dec!(50000));

        let total: Decimal = result.suspended_by_property.values().copied().sum();
        assert_eq!(total, result.suspended_loss);
        assert_eq!(result.suspended_by_property["c"], dec!(50));

        let odd = [loss("a", dec!(1), false), loss("b", dec!(1), false), loss("c", dec!(1), false)];
        let (result, _) = limit(FilingStatus::Single, dec!(2.99), &odd, dec!(50000));

        // 0.01 suspended; each share rounds to 0.00 before the remainder
        let total: Decimal = result.suspended_by_property.values().copied().sum();
        assert_eq!(total, dec!(0.01));
    }

    #[test]
    fn records_for_same_property_merged() {
        let losses = [loss("condo", dec!(3000), false), loss("condo", dec!(2000), true)];

        let (result, _) = limit(FilingStatus::Single, dec!(0), &losses, dec!(50000));

        assert_eq!(result.total_loss, dec!(5000));
        assert_eq!(result.allowed_loss, dec!(5000));
    }
}
