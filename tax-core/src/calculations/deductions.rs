//! Taxable social security and the standard-vs-itemized choice.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{
    AlertCode, ComplianceAlert, DeductionDetail, DeductionItem, DeductionKind, DeductionLimits,
    DeductionSummary, FilingStatus, SocialSecurityLimits, TaxPayer,
};

/// Taxable portion of social security benefits (benefits worksheet).
///
/// `other_income` is gross income excluding benefits, less adjustments.
pub fn taxable_social_security(
    limits: &SocialSecurityLimits,
    filing_status: FilingStatus,
    benefits: Decimal,
    other_income: Decimal,
    tax_exempt_interest: Decimal,
) -> Decimal {
    if benefits <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let base = limits.base.get(filing_status);
    let half_benefits = benefits * dec!(0.5);
    let provisional = other_income + tax_exempt_interest + half_benefits;

    let taxable = if provisional <= base.base_amount {
        Decimal::ZERO
    } else if provisional <= base.adjusted_base_amount {
        (benefits * limits.lower_rate).min(limits.lower_rate * (provisional - base.base_amount))
    } else {
        let lower_tier = (benefits * limits.lower_rate)
            .min(limits.lower_rate * (base.adjusted_base_amount - base.base_amount));
        (benefits * limits.upper_rate).min(
            limits.upper_rate * (provisional - base.adjusted_base_amount) + lower_tier,
        )
    };

    debug!(
        provisional = %provisional,
        benefits = %benefits,
        taxable = %taxable,
        "computed taxable social security"
    );

    round_half_up(taxable)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionResult {
    pub summary: DeductionSummary,
    pub charitable_carryover: Decimal,
}

/// Mortgages sharing one debt cap.
#[derive(Debug, Default)]
struct MortgagePool {
    interest: Decimal,
    balance: Decimal,
}

impl MortgagePool {
    /// Interest on the part of the balance within `allowed_debt`.
    fn deductible(
        &self,
        allowed_debt: Decimal,
    ) -> Decimal {
        if self.balance <= allowed_debt {
            return self.interest;
        }
        debug!(
            balance = %self.balance,
            allowed = %allowed_debt,
            "mortgage debt above cap; scaling interest"
        );
        self.interest * allowed_debt / self.balance
    }
}

/// Chooses between the standard deduction and itemized deductions.
#[derive(Debug, Clone)]
pub struct DeductionSelector<'a> {
    limits: &'a DeductionLimits,
}

impl<'a> DeductionSelector<'a> {
    pub fn new(limits: &'a DeductionLimits) -> Self {
        Self { limits }
    }

    pub fn calculate(
        &self,
        taxpayer: &TaxPayer,
        items: &[DeductionItem],
        agi: Decimal,
        alerts: &mut Vec<ComplianceAlert>,
    ) -> DeductionResult {
        let status = taxpayer.filing_status;

        let mortgage_interest = self.mortgage_interest(status, items);
        let (charitable, charitable_carryover) = self.charitable(items, agi, alerts);
        let (salt_claimed, salt_disallowed) = self.salt(status, items);
        let medical = self.medical(items, agi);

        let itemized = round_half_up(mortgage_interest + charitable + salt_claimed + medical);
        let standard = self.standard(taxpayer);

        // Ties resolve to the standard deduction
        let (used, kind) = if itemized > standard {
            (itemized, DeductionKind::Itemized)
        } else {
            (standard, DeductionKind::Standard)
        };

        debug!(
            standard = %standard,
            itemized = %itemized,
            kind = ?kind,
            "selected deduction"
        );

        DeductionResult {
            summary: DeductionSummary {
                standard,
                itemized,
                used,
                kind,
                mortgage_interest,
                charitable,
                medical,
                salt_claimed,
                salt_disallowed,
                qbi: Decimal::ZERO,
            },
            charitable_carryover,
        }
    }

    /// Base standard deduction plus the age/blindness add-ons.
    pub fn standard(
        &self,
        taxpayer: &TaxPayer,
    ) -> Decimal {
        let status = taxpayer.filing_status;
        let add_on = if status.is_married() {
            self.limits.additional_married
        } else {
            self.limits.additional_unmarried
        };
        let count = Decimal::from(taxpayer.additional_deduction_count());
        round_half_up(*self.limits.standard.get(status) + count * add_on)
    }

    /// Mortgage interest, scaled down when the combined balance exceeds the
    /// debt cap.
    ///
    /// Grandfathered loans count against their own cap first; whatever they
    /// use also comes off the current cap available to newer loans.
    fn mortgage_interest(
        &self,
        status: FilingStatus,
        items: &[DeductionItem],
    ) -> Decimal {
        let mut grandfathered = MortgagePool::default();
        let mut current = MortgagePool::default();

        for item in items {
            let DeductionDetail::MortgageInterest {
                origination_date,
                balance,
            } = &item.detail
            else {
                continue;
            };

            let pool = match origination_date {
                Some(date) if *date <= self.limits.mortgage_cap_cutoff => &mut grandfathered,
                _ => &mut current,
            };
            pool.interest += non_negative(item.amount);
            pool.balance += non_negative(*balance);
        }

        let grandfathered_debt =
            grandfathered.balance.min(*self.limits.grandfathered_mortgage_debt_cap.get(status));
        let current_debt = current.balance.min(non_negative(
            *self.limits.mortgage_debt_cap.get(status) - grandfathered_debt,
        ));

        round_half_up(grandfathered.deductible(grandfathered_debt) + current.deductible(current_debt))
    }

    /// Charitable contributions limited by AGI. Returns (allowed, carryover).
    fn charitable(
        &self,
        items: &[DeductionItem],
        agi: Decimal,
        alerts: &mut Vec<ComplianceAlert>,
    ) -> (Decimal, Decimal) {
        let (mut cash, mut noncash) = (Decimal::ZERO, Decimal::ZERO);
        for item in items {
            if let DeductionDetail::Charity { cash: is_cash } = item.detail {
                if is_cash {
                    cash += non_negative(item.amount);
                } else {
                    noncash += non_negative(item.amount);
                }
            }
        }

        let agi = non_negative(agi);
        let cash_limit = round_half_up(agi * self.limits.charity_cash_agi_limit);
        let noncash_limit = round_half_up(agi * self.limits.charity_noncash_agi_limit);

        let cash_allowed = cash.min(cash_limit);
        let noncash_allowed = noncash
            .min(noncash_limit)
            .min(non_negative(cash_limit - cash_allowed));
        let allowed = round_half_up(cash_allowed + noncash_allowed);
        let carryover = round_half_up(cash + noncash - allowed);

        if carryover > Decimal::ZERO {
            alerts.push(ComplianceAlert::info(
                AlertCode::CharitableLimit,
                format!("Charitable contributions of {carryover} exceed the AGI limit and carry forward"),
            ));
        }

        (allowed, carryover)
    }

    /// State and local taxes capped by filing status. Returns (claimed, disallowed).
    fn salt(
        &self,
        status: FilingStatus,
        items: &[DeductionItem],
    ) -> (Decimal, Decimal) {
        let paid: Decimal = items
            .iter()
            .filter(|item| matches!(item.detail, DeductionDetail::StateLocalTax { .. }))
            .map(|item| non_negative(item.amount))
            .sum();

        let claimed = paid.min(*self.limits.salt_cap.get(status));
        (round_half_up(claimed), round_half_up(paid - claimed))
    }

    /// Medical expenses above the AGI floor.
    fn medical(
        &self,
        items: &[DeductionItem],
        agi: Decimal,
    ) -> Decimal {
        let expenses: Decimal = items
            .iter()
            .filter(|item| matches!(item.detail, DeductionDetail::Medical))
            .map(|item| non_negative(item.amount))
            .sum();

        let floor = non_negative(agi) * self.limits.medical_agi_floor;
        round_half_up(non_negative(expenses - floor))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{SaltKind, TaxYearProfile};

    fn profile() -> TaxYearProfile {
        TaxYearProfile::tax_year_2025()
    }

    fn mortgage(
        interest: Decimal,
        balance: Decimal,
        year: i32,
    ) -> DeductionItem {
        DeductionItem::new(
            "1098",
            interest,
            DeductionDetail::MortgageInterest {
                origination_date: NaiveDate::from_ymd_opt(year, 6, 1),
                balance,
            },
        )
    }

    fn salt(amount: Decimal) -> DeductionItem {
        DeductionItem::new(
            "property-tax",
            amount,
            DeductionDetail::StateLocalTax {
                kind: SaltKind::Property,
            },
        )
    }

    fn charity(
        amount: Decimal,
        cash: bool,
    ) -> DeductionItem {
        DeductionItem::new("gift", amount, DeductionDetail::Charity { cash })
    }

    fn select(
        taxpayer: &TaxPayer,
        items: &[DeductionItem],
        agi: Decimal,
    ) -> (DeductionResult, Vec<ComplianceAlert>) {
        let profile = profile();
        let mut alerts = Vec::new();
        let result =
            DeductionSelector::new(&profile.deductions).calculate(taxpayer, items, agi, &mut alerts);
        (result, alerts)
    }

    // =========================================================================
    // taxable_social_security tests
    // =========================================================================

    #[test]
    fn benefits_untaxed_below_base() {
        let profile = profile();
        let taxable = taxable_social_security(
            &profile.social_security,
            FilingStatus::Single,
            dec!(20000),
            dec!(10000),
            dec!(0),
        );

        assert_eq!(taxable, dec!(0));
    }

    #[test]
    fn benefits_half_taxed_between_bases() {
        let profile = profile();
        // Provisional 20,000 + 10,000 = 30,000; 50% of 5,000 over base
        let taxable = taxable_social_security(
            &profile.social_security,
            FilingStatus::Single,
            dec!(20000),
            dec!(20000),
            dec!(0),
        );

        assert_eq!(taxable, dec!(2500.00));
    }

    #[test]
    fn benefits_taxed_at_upper_tier() {
        let profile = profile();
        // Provisional 40,000 + 5,000 + 10,000 = 55,000
        // 85% x 21,000 + min(10,000, 4,500) = 22,350 capped at 17,000
        let taxable = taxable_social_security(
            &profile.social_security,
            FilingStatus::Single,
            dec!(20000),
            dec!(40000),
            dec!(5000),
        );

        assert_eq!(taxable, dec!(17000.00));

        // Provisional 30,000 + 8,000 = 38,000
        // 85% x 4,000 + min(8,000, 4,500) = 7,900
        let taxable = taxable_social_security(
            &profile.social_security,
            FilingStatus::Single,
            dec!(16000),
            dec!(30000),
            dec!(0),
        );

        assert_eq!(taxable, dec!(7900.00));
    }

    // =========================================================================
    // DeductionSelector tests
    // =========================================================================

    #[test]
    fn standard_includes_age_and_blind_add_ons() {
        let mut single = TaxPayer::new(FilingStatus::Single);
        single.age_65_or_older = true;
        single.blind = true;
        let profile = profile();
        let selector = DeductionSelector::new(&profile.deductions);

        assert_eq!(selector.standard(&single), dec!(19600));

        let mut joint = TaxPayer::new(FilingStatus::MarriedFilingJointly);
        joint.age_65_or_older = true;
        joint.spouse_age_65_or_older = true;

        assert_eq!(selector.standard(&joint), dec!(34400));
    }

    #[test]
    fn itemized_used_only_when_larger() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);

        let (result, _) = select(&taxpayer, &[salt(dec!(8000)), charity(dec!(9000), true)], dec!(100000));

        assert_eq!(result.summary.itemized, dec!(17000));
        assert_eq!(result.summary.used, dec!(17000));
        assert_eq!(result.summary.kind, DeductionKind::Itemized);
    }

    #[test]
    fn tie_resolves_to_standard() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);

        let (result, _) = select(&taxpayer, &[salt(dec!(8000)), charity(dec!(7600), true)], dec!(100000));

        assert_eq!(result.summary.itemized, dec!(15600));
        assert_eq!(result.summary.kind, DeductionKind::Standard);
        assert_eq!(result.summary.used, dec!(15600));
    }

    #[test]
    fn salt_capped_by_status() {
        let (joint, _) = select(
            &TaxPayer::new(FilingStatus::MarriedFilingJointly),
            &[salt(dec!(14000))],
            dec!(100000),
        );
        let (separate, _) = select(
            &TaxPayer::new(FilingStatus::MarriedFilingSeparately),
            &[salt(dec!(14000))],
            dec!(100000),
        );

        assert_eq!(joint.summary.salt_claimed, dec!(10000));
        assert_eq!(joint.summary.salt_disallowed, dec!(4000));
        assert_eq!(separate.summary.salt_claimed, dec!(5000));
    }

    #[test]
    fn mortgage_interest_scaled_above_debt_cap() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);

        let (result, _) = select(&taxpayer, &[mortgage(dec!(36000), dec!(900000), 2020)], dec!(200000));

        // 36,000 x 750,000 / 900,000
        assert_eq!(result.summary.mortgage_interest, dec!(30000.00));
    }

    #[test]
    fn grandfathered_mortgage_uses_higher_cap() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);

        let (result, _) = select(&taxpayer, &[mortgage(dec!(36000), dec!(900000), 2015)], dec!(200000));

        assert_eq!(result.summary.mortgage_interest, dec!(36000));
    }

    #[test]
    fn debt_cap_applies_to_combined_balances() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);
        let homes = [
            mortgage(dec!(15000), dec!(500000), 2020),
            mortgage(dec!(15000), dec!(500000), 2022),
        ];

        let (result, _) = select(&taxpayer, &homes, dec!(200000));

        // 30,000 x 750,000 / 1,000,000
        assert_eq!(result.summary.mortgage_interest, dec!(22500.00));
    }

    #[test]
    fn grandfathered_debt_uses_up_the_current_cap_first() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);
        let homes = [
            mortgage(dec!(24000), dec!(600000), 2015),
            mortgage(dec!(20000), dec!(400000), 2020),
        ];

        let (result, _) = select(&taxpayer, &homes, dec!(200000));

        // 24,000 in full + 20,000 x 150,000 / 400,000
        assert_eq!(result.summary.mortgage_interest, dec!(31500.00));
    }

    #[test]
    fn newer_loan_gets_nothing_once_grandfathered_debt_exceeds_current_cap() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);
        let homes = [
            mortgage(dec!(36000), dec!(900000), 2015),
            mortgage(dec!(8000), dec!(200000), 2021),
        ];

        let (result, _) = select(&taxpayer, &homes, dec!(200000));

        assert_eq!(result.summary.mortgage_interest, dec!(36000));
    }

    #[test]
    fn mortgage_cap_halved_for_married_separate() {
        let taxpayer = TaxPayer::new(FilingStatus::MarriedFilingSeparately);

        let (result, _) = select(&taxpayer, &[mortgage(dec!(20000), dec!(500000), 2021)], dec!(200000));

        // 20,000 x 375,000 / 500,000
        assert_eq!(result.summary.mortgage_interest, dec!(15000.00));
    }

    #[test]
    fn charity_limited_by_agi() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);

        let (result, alerts) = select(
            &taxpayer,
            &[charity(dec!(40000), true), charity(dec!(20000), false)],
            dec!(50000),
        );

        // Cash limit 30,000 uses the whole 60% ceiling
        assert_eq!(result.summary.charitable, dec!(30000.00));
        assert_eq!(result.charitable_carryover, dec!(30000.00));
        assert_eq!(alerts[0].code, AlertCode::CharitableLimit);
    }

    #[test]
    fn noncash_charity_limited_to_thirty_percent() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);

        let (result, _) = select(&taxpayer, &[charity(dec!(20000), false)], dec!(50000));

        assert_eq!(result.summary.charitable, dec!(15000.00));
        assert_eq!(result.charitable_carryover, dec!(5000.00));
    }

    #[test]
    fn medical_above_agi_floor() {
        let taxpayer = TaxPayer::new(FilingStatus::Single);
        let items = [DeductionItem::new("clinic", dec!(10000), DeductionDetail::Medical)];

        let (result, _) = select(&taxpayer, &items, dec!(80000));

        assert_eq!(result.summary.medical, dec!(4000.00));
    }
}
