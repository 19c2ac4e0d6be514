//! Income classification.
//!
//! Partitions raw [`IncomeItem`] records into the category totals consumed by
//! every later stage. Amounts are summed as reported; nothing is rounded here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::non_negative;
use crate::models::{
    AlertCode, ComplianceAlert, HoldingPeriod, IncomeDetail, IncomeItem, WashSaleTreatment,
};

/// A negative passive record, kept per property for carryover allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveLoss {
    pub property_id: String,
    /// Loss magnitude (positive).
    pub amount: Decimal,
    pub active_participation: bool,
}

/// Category totals produced by [`IncomeClassifier`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTotals {
    pub wages: Decimal,
    pub ss_wages: Decimal,
    pub medicare_wages: Decimal,
    pub taxable_interest: Decimal,
    pub tax_exempt_interest: Decimal,
    pub ordinary_dividends: Decimal,
    pub qualified_dividends: Decimal,
    pub short_term_gain: Decimal,
    pub long_term_gain: Decimal,
    pub unrecaptured_1250_gain: Decimal,
    pub collectibles_gain: Decimal,
    pub business_income: Decimal,
    pub qbi_income: Decimal,
    pub qbi_w2_wages: Decimal,
    pub qbi_ubia: Decimal,
    pub sstb: bool,
    pub passive_income: Decimal,
    pub passive_losses: Vec<PassiveLoss>,
    pub social_security_benefits: Decimal,
    pub iso_bargain_element: Decimal,
    pub other_income: Decimal,
    /// Investment income for the earned income credit test.
    pub investment_income: Decimal,
    pub withholding: Decimal,
}

impl IncomeTotals {
    /// Sum of all capital gain buckets, before the loss limit.
    pub fn net_capital(&self) -> Decimal {
        self.short_term_gain
            + self.long_term_gain
            + self.unrecaptured_1250_gain
            + self.collectibles_gain
    }
}

/// Routes income records into category accumulators.
#[derive(Debug, Clone, Copy)]
pub struct IncomeClassifier {
    wash_sale_treatment: WashSaleTreatment,
}

impl IncomeClassifier {
    pub fn new(wash_sale_treatment: WashSaleTreatment) -> Self {
        Self {
            wash_sale_treatment,
        }
    }

    pub fn classify(
        &self,
        items: &[IncomeItem],
        alerts: &mut Vec<ComplianceAlert>,
    ) -> IncomeTotals {
        let mut totals = IncomeTotals::default();

        for item in items {
            totals.withholding += item.withholding;

            match &item.detail {
                IncomeDetail::Wage {
                    social_security_wages,
                    medicare_wages,
                } => {
                    totals.wages += item.amount;
                    totals.ss_wages += social_security_wages.unwrap_or(item.amount);
                    totals.medicare_wages += medicare_wages.unwrap_or(item.amount);
                }
                IncomeDetail::Interest { tax_exempt } => {
                    if *tax_exempt {
                        totals.tax_exempt_interest += item.amount;
                    } else {
                        totals.taxable_interest += item.amount;
                    }
                    totals.investment_income += item.amount;
                }
                IncomeDetail::Dividend { qualified } => {
                    totals.ordinary_dividends += item.amount;
                    totals.qualified_dividends += (*qualified).clamp(
                        Decimal::ZERO,
                        non_negative(item.amount),
                    );
                    totals.investment_income += item.amount;
                }
                IncomeDetail::CapitalGain {
                    cost_basis,
                    holding,
                    wash_sale_loss_disallowed,
                } => self.classify_gain(
                    &mut totals,
                    item,
                    item.amount - *cost_basis,
                    *holding,
                    *wash_sale_loss_disallowed,
                    alerts,
                ),
                IncomeDetail::Passive {
                    property_id,
                    active_participation,
                } => {
                    if item.amount >= Decimal::ZERO {
                        totals.passive_income += item.amount;
                        totals.investment_income += item.amount;
                    } else {
                        totals.passive_losses.push(PassiveLoss {
                            property_id: property_id.clone(),
                            amount: -item.amount,
                            active_participation: *active_participation,
                        });
                    }
                }
                IncomeDetail::Business {
                    expenses,
                    w2_wages,
                    ubia,
                    sstb,
                } => {
                    let net = item.amount - *expenses;
                    totals.business_income += net;
                    totals.qbi_income += net;
                    totals.qbi_w2_wages += *w2_wages;
                    totals.qbi_ubia += *ubia;
                    if *sstb {
                        totals.sstb = true;
                    }
                }
                IncomeDetail::SocialSecurity => {
                    totals.social_security_benefits += item.amount;
                }
                IncomeDetail::IsoExercise {
                    shares,
                    exercise_price,
                    fair_market_value,
                } => {
                    let bargain = if *shares > Decimal::ZERO {
                        fair_market_value
                            .checked_sub(*exercise_price)
                            .and_then(|spread| shares.checked_mul(spread))
                            .unwrap_or_else(|| {
                                warn!(id = %item.id, shares = %shares, "ISO spread overflowed");
                                alerts.push(ComplianceAlert::warning(
                                    AlertCode::AmountOverflow,
                                    format!(
                                        "ISO exercise '{}': {} shares at {} over {} is too large \
                                         to compute; using the reported amount {}",
                                        item.id,
                                        shares,
                                        fair_market_value,
                                        exercise_price,
                                        item.amount
                                    ),
                                ));
                                item.amount
                            })
                    } else {
                        item.amount
                    };
                    totals.iso_bargain_element += non_negative(bargain);
                }
                IncomeDetail::Other => {
                    totals.other_income += item.amount;
                }
            }
        }

        debug!(
            wages = %totals.wages,
            business = %totals.business_income,
            net_capital = %totals.net_capital(),
            passive_income = %totals.passive_income,
            passive_losses = totals.passive_losses.len(),
            "classified income records"
        );

        totals
    }

    fn classify_gain(
        &self,
        totals: &mut IncomeTotals,
        item: &IncomeItem,
        gain: Decimal,
        holding: HoldingPeriod,
        wash_sale_loss_disallowed: bool,
        alerts: &mut Vec<ComplianceAlert>,
    ) {
        let mut gain = gain;

        if wash_sale_loss_disallowed && gain < Decimal::ZERO {
            let excluded = self.wash_sale_treatment == WashSaleTreatment::Disallow;
            alerts.push(ComplianceAlert::info(
                AlertCode::WashSaleDetected,
                if excluded {
                    format!(
                        "Wash sale on '{}': loss of {} disallowed and excluded",
                        item.id, -gain
                    )
                } else {
                    format!(
                        "Wash sale on '{}': loss of {} is disallowed but still reported",
                        item.id, -gain
                    )
                },
            ));
            if excluded {
                gain = Decimal::ZERO;
            }
        }

        match holding {
            HoldingPeriod::ShortTerm => totals.short_term_gain += gain,
            HoldingPeriod::LongTerm => totals.long_term_gain += gain,
            HoldingPeriod::Unrecaptured1250 => totals.unrecaptured_1250_gain += gain,
            HoldingPeriod::Collectibles => totals.collectibles_gain += gain,
        }

        if gain > Decimal::ZERO {
            totals.investment_income += gain;
        }
    }
}

/// Capital gains after netting and the annual loss limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainSplit {
    /// Amount entering gross income: the net gain, or the allowed loss.
    pub allowed: Decimal,
    /// Net loss beyond the annual limit.
    pub carryover: Decimal,
    /// Long-term gain eligible for 0/15/20% rates.
    pub long_term: Decimal,
    pub unrecaptured_1250: Decimal,
    pub collectibles: Decimal,
}

impl CapitalGainSplit {
    /// Long-term gain taxed below ordinary rates (all three groups).
    pub fn net_capital_gain(&self) -> Decimal {
        self.long_term + self.unrecaptured_1250 + self.collectibles
    }
}

/// Nets capital gains and losses and applies the annual loss limit.
///
/// Losses offset the 28% group first, then the 25% group, then the 0/15/20%
/// group; whatever remains offsets short-term gain.
pub fn split_capital_gains(
    totals: &IncomeTotals,
    loss_limit: Decimal,
) -> CapitalGainSplit {
    let net = totals.net_capital();

    let mut loss = [
        totals.short_term_gain,
        totals.long_term_gain,
        totals.unrecaptured_1250_gain,
        totals.collectibles_gain,
    ]
    .iter()
    .map(|bucket| non_negative(-*bucket))
    .sum::<Decimal>();

    let mut groups = [
        non_negative(totals.collectibles_gain),
        non_negative(totals.unrecaptured_1250_gain),
        non_negative(totals.long_term_gain),
    ];
    for group in groups.iter_mut() {
        let used = loss.min(*group);
        *group -= used;
        loss -= used;
    }
    let [collectibles, unrecaptured_1250, long_term] = groups;

    let (allowed, carryover) = if net < Decimal::ZERO {
        let allowed = net.max(-loss_limit);
        (allowed, allowed - net)
    } else {
        (net, Decimal::ZERO)
    };

    CapitalGainSplit {
        allowed,
        carryover,
        long_term,
        unrecaptured_1250,
        collectibles,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Severity;

    fn gain(
        id: &str,
        proceeds: Decimal,
        basis: Decimal,
        holding: HoldingPeriod,
        wash: bool,
    ) -> IncomeItem {
        IncomeItem::new(
            id,
            proceeds,
            IncomeDetail::CapitalGain {
                cost_basis: basis,
                holding,
                wash_sale_loss_disallowed: wash,
            },
        )
    }

    fn classify(items: &[IncomeItem]) -> (IncomeTotals, Vec<ComplianceAlert>) {
        let mut alerts = Vec::new();
        let totals =
            IncomeClassifier::new(WashSaleTreatment::ReportAsFiled).classify(items, &mut alerts);
        (totals, alerts)
    }

    #[test]
    fn wages_default_ss_and_medicare_wages_to_amount() {
        let items = [
            IncomeItem::wage("w2-a", dec!(60000)).with_withholding(dec!(5000)),
            IncomeItem::new(
                "w2-b",
                dec!(20000),
                IncomeDetail::Wage {
                    social_security_wages: Some(dec!(18000)),
                    medicare_wages: None,
                },
            ),
        ];

        let (totals, _) = classify(&items);

        assert_eq!(totals.wages, dec!(80000));
        assert_eq!(totals.ss_wages, dec!(78000));
        assert_eq!(totals.medicare_wages, dec!(80000));
        assert_eq!(totals.withholding, dec!(5000));
    }

    #[test]
    fn interest_split_by_exemption() {
        let items = [
            IncomeItem::new("bank", dec!(300), IncomeDetail::Interest { tax_exempt: false }),
            IncomeItem::new("muni", dec!(700), IncomeDetail::Interest { tax_exempt: true }),
        ];

        let (totals, _) = classify(&items);

        assert_eq!(totals.taxable_interest, dec!(300));
        assert_eq!(totals.tax_exempt_interest, dec!(700));
        assert_eq!(totals.investment_income, dec!(1000));
    }

    #[test]
    fn qualified_dividends_clamped_to_ordinary_amount() {
        let items = [IncomeItem::new(
            "1099-div",
            dec!(1000),
            IncomeDetail::Dividend {
                qualified: dec!(1500),
            },
        )];

        let (totals, _) = classify(&items);

        assert_eq!(totals.ordinary_dividends, dec!(1000));
        assert_eq!(totals.qualified_dividends, dec!(1000));
    }

    #[test]
    fn gains_route_by_holding_period() {
        let items = [
            gain("a", dec!(1500), dec!(1000), HoldingPeriod::ShortTerm, false),
            gain("b", dec!(9000), dec!(4000), HoldingPeriod::LongTerm, false),
            gain("c", dec!(3000), dec!(1000), HoldingPeriod::Unrecaptured1250, false),
            gain("d", dec!(800), dec!(500), HoldingPeriod::Collectibles, false),
            gain("e", dec!(200), dec!(700), HoldingPeriod::LongTerm, false),
        ];

        let (totals, _) = classify(&items);

        assert_eq!(totals.short_term_gain, dec!(500));
        assert_eq!(totals.long_term_gain, dec!(4500));
        assert_eq!(totals.unrecaptured_1250_gain, dec!(2000));
        assert_eq!(totals.collectibles_gain, dec!(300));
        // Only gains count toward investment income
        assert_eq!(totals.investment_income, dec!(7800));
    }

    #[test]
    fn wash_sale_loss_reported_with_info_alert() {
        let items = [gain("lot", dec!(4000), dec!(5000), HoldingPeriod::ShortTerm, true)];

        let (totals, alerts) = classify(&items);

        assert_eq!(totals.short_term_gain, dec!(-1000));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].code, AlertCode::WashSaleDetected);
        assert_eq!(alerts[0].severity, Severity::Info);
    }

    #[test]
    fn wash_sale_loss_excluded_when_disallowed() {
        let items = [gain("lot", dec!(4000), dec!(5000), HoldingPeriod::ShortTerm, true)];
        let mut alerts = Vec::new();

        let totals =
            IncomeClassifier::new(WashSaleTreatment::Disallow).classify(&items, &mut alerts);

        assert_eq!(totals.short_term_gain, dec!(0));
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn wash_sale_flag_on_gain_is_ignored() {
        let items = [gain("lot", dec!(6000), dec!(5000), HoldingPeriod::ShortTerm, true)];

        let (totals, alerts) = classify(&items);

        assert_eq!(totals.short_term_gain, dec!(1000));
        assert!(alerts.is_empty());
    }

    #[test]
    fn business_nets_expenses_and_tracks_qbi_inputs() {
        let items = [
            IncomeItem::new(
                "consulting",
                dec!(120000),
                IncomeDetail::Business {
                    expenses: dec!(20000),
                    w2_wages: dec!(0),
                    ubia: dec!(0),
                    sstb: true,
                },
            ),
            IncomeItem::new(
                "shop",
                dec!(50000),
                IncomeDetail::Business {
                    expenses: dec!(60000),
                    w2_wages: dec!(15000),
                    ubia: dec!(40000),
                    sstb: false,
                },
            ),
        ];

        let (totals, _) = classify(&items);

        assert_eq!(totals.business_income, dec!(90000));
        assert_eq!(totals.qbi_income, dec!(90000));
        assert_eq!(totals.qbi_w2_wages, dec!(15000));
        assert_eq!(totals.qbi_ubia, dec!(40000));
        assert!(totals.sstb);
    }

    #[test]
    fn passive_losses_kept_per_property() {
        let items = [
            IncomeItem::new(
                "duplex",
                dec!(8000),
                IncomeDetail::Passive {
                    property_id: "duplex".to_string(),
                    active_participation: true,
                },
            ),
            IncomeItem::new(
                "condo",
                dec!(-12000),
                IncomeDetail::Passive {
                    property_id: "condo".to_string(),
                    active_participation: true,
                },
            ),
        ];

        let (totals, _) = classify(&items);

        assert_eq!(totals.passive_income, dec!(8000));
        assert_eq!(
            totals.passive_losses,
            vec![PassiveLoss {
                property_id: "condo".to_string(),
                amount: dec!(12000),
                active_participation: true,
            }]
        );
    }

    #[test]
    fn iso_bargain_element_from_share_detail() {
        let items = [
            IncomeItem::new(
                "grant-1",
                dec!(0),
                IncomeDetail::IsoExercise {
                    shares: dec!(1000),
                    exercise_price: dec!(10),
                    fair_market_value: dec!(45),
                },
            ),
            IncomeItem::new(
                "grant-2",
                dec!(5000),
                IncomeDetail::IsoExercise {
                    shares: dec!(0),
                    exercise_price: dec!(0),
                    fair_market_value: dec!(0),
                },
            ),
        ];

        let (totals, _) = classify(&items);

        assert_eq!(totals.iso_bargain_element, dec!(40000));
    }

    #[test]
    fn iso_spread_too_large_falls_back_to_reported_amount() {
        let items = [IncomeItem::new(
            "grant-huge",
            dec!(2500),
            IncomeDetail::IsoExercise {
                shares: dec!(1_000_000_000_000_000),
                exercise_price: dec!(0),
                fair_market_value: dec!(1_000_000_000_000_000),
            },
        )];

        let (totals, alerts) = classify(&items);

        assert_eq!(totals.iso_bargain_element, dec!(2500));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].code, AlertCode::AmountOverflow);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    // =========================================================================
    // split_capital_gains tests
    // =========================================================================

    #[test]
    fn net_loss_limited_and_carried_over() {
        let totals = IncomeTotals {
            short_term_gain: dec!(-8000),
            long_term_gain: dec!(1000),
            ..IncomeTotals::default()
        };

        let split = split_capital_gains(&totals, dec!(3000));

        assert_eq!(split.allowed, dec!(-3000));
        assert_eq!(split.carryover, dec!(4000));
        assert_eq!(split.net_capital_gain(), dec!(0));
    }

    #[test]
    fn short_term_loss_offsets_collectibles_first() {
        let totals = IncomeTotals {
            short_term_gain: dec!(-1500),
            long_term_gain: dec!(10000),
            unrecaptured_1250_gain: dec!(2000),
            collectibles_gain: dec!(1000),
            ..IncomeTotals::default()
        };

        let split = split_capital_gains(&totals, dec!(3000));

        assert_eq!(split.allowed, dec!(11500));
        assert_eq!(split.collectibles, dec!(0));
        assert_eq!(split.unrecaptured_1250, dec!(1500));
        assert_eq!(split.long_term, dec!(10000));
    }

    #[test]
    fn short_term_gain_is_not_preferential() {
        let totals = IncomeTotals {
            short_term_gain: dec!(5000),
            long_term_gain: dec!(-2000),
            ..IncomeTotals::default()
        };

        let split = split_capital_gains(&totals, dec!(3000));

        assert_eq!(split.allowed, dec!(3000));
        assert_eq!(split.net_capital_gain(), dec!(0));
    }
}
