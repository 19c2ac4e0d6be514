//! Credits against income tax.
//!
//! Credits are applied in a fixed order so each nonrefundable credit only
//! consumes the income tax left by the ones before it:
//!
//! 1. American opportunity credit (40% refundable, rest nonrefundable)
//! 2. Earned income credit (refundable)
//! 3. Child tax credit; the refundable ACTC portion is taken first
//! 4. Credit for other dependents
//! 5. Residential energy credit
//! 6. Adoption credit

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{
    AlertCode, AotcLimits, ChildCreditLimits, ComplianceAlert, CreditAmount, CreditLimits,
    CreditSummary, DeductionDetail, DeductionItem, EicLimits, FilingStatus, TaxPayer,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInput {
    pub agi: Decimal,
    pub earned_income: Decimal,
    pub investment_income: Decimal,
    /// Regular tax plus AMT; the ceiling for nonrefundable credits.
    pub income_tax: Decimal,
}

/// Income tax still available to absorb nonrefundable credits.
#[derive(Debug, Clone, Copy)]
struct TaxRemaining(Decimal);

impl TaxRemaining {
    fn take(
        &mut self,
        credit: Decimal,
    ) -> Decimal {
        let used = non_negative(credit).min(self.0);
        self.0 -= used;
        used
    }
}

#[derive(Debug, Clone)]
pub struct CreditEngine<'a> {
    limits: &'a CreditLimits,
}

impl<'a> CreditEngine<'a> {
    pub fn new(limits: &'a CreditLimits) -> Self {
        Self { limits }
    }

    pub fn calculate(
        &self,
        taxpayer: &TaxPayer,
        items: &[DeductionItem],
        input: &CreditInput,
        alerts: &mut Vec<ComplianceAlert>,
    ) -> CreditSummary {
        let status = taxpayer.filing_status;
        let mut remaining = TaxRemaining(non_negative(input.income_tax));

        let mut american_opportunity_credit =
            american_opportunity(&self.limits.aotc, status, items, input.agi, alerts);
        american_opportunity_credit.nonrefundable =
            remaining.take(american_opportunity_credit.nonrefundable);

        let earned_income_credit = CreditAmount {
            nonrefundable: Decimal::ZERO,
            refundable: earned_income(&self.limits.eic, taxpayer, input, alerts),
        };

        let (mut child_tax_credit, other_dependent_potential) =
            child_credits(&self.limits.child, taxpayer, input);
        child_tax_credit.nonrefundable = remaining.take(child_tax_credit.nonrefundable);

        let other_dependent_credit = CreditAmount {
            nonrefundable: remaining.take(other_dependent_potential),
            refundable: Decimal::ZERO,
        };

        let energy_credit = CreditAmount {
            nonrefundable: remaining.take(self.energy(items)),
            refundable: Decimal::ZERO,
        };

        let adoption_credit = CreditAmount {
            nonrefundable: remaining.take(self.adoption(items, input.agi)),
            refundable: Decimal::ZERO,
        };

        let parts = [
            &child_tax_credit,
            &other_dependent_credit,
            &earned_income_credit,
            &american_opportunity_credit,
            &energy_credit,
            &adoption_credit,
        ];
        let total_nonrefundable = parts.iter().map(|c| c.nonrefundable).sum();
        let total_refundable = parts.iter().map(|c| c.refundable).sum();

        debug!(
            ctc = %child_tax_credit.total(),
            odc = %other_dependent_credit.total(),
            eic = %earned_income_credit.total(),
            aotc = %american_opportunity_credit.total(),
            nonrefundable = %total_nonrefundable,
            refundable = %total_refundable,
            "computed credits"
        );

        CreditSummary {
            child_tax_credit,
            other_dependent_credit,
            earned_income_credit,
            american_opportunity_credit,
            energy_credit,
            adoption_credit,
            total_nonrefundable,
            total_refundable,
        }
    }

    fn energy(
        &self,
        items: &[DeductionItem],
    ) -> Decimal {
        let expenses: Decimal = items
            .iter()
            .filter(|item| matches!(item.detail, DeductionDetail::EnergyImprovement))
            .map(|item| non_negative(item.amount))
            .sum();
        round_half_up(expenses * self.limits.energy_rate)
    }

    /// Qualified adoption expenses, capped per child and phased out by AGI.
    fn adoption(
        &self,
        items: &[DeductionItem],
        agi: Decimal,
    ) -> Decimal {
        let limits = &self.limits.adoption;
        let capped: Decimal = items
            .iter()
            .filter(|item| matches!(item.detail, DeductionDetail::Adoption))
            .map(|item| non_negative(item.amount).min(limits.max_credit))
            .sum();
        round_half_up(capped * limits.phaseout.factor(agi))
    }
}

/// American opportunity credit per eligible student.
fn american_opportunity(
    limits: &AotcLimits,
    status: FilingStatus,
    items: &[DeductionItem],
    agi: Decimal,
    alerts: &mut Vec<ComplianceAlert>,
) -> CreditAmount {
    let mut expenses_by_student: BTreeMap<String, Decimal> = BTreeMap::new();

    for item in items {
        let DeductionDetail::Tuition {
            student,
            half_time,
            first_four_years,
            drug_conviction,
        } = &item.detail
        else {
            continue;
        };

        let student = if student.is_empty() {
            item.id.clone()
        } else {
            student.clone()
        };

        if !*half_time || !*first_four_years || *drug_conviction {
            alerts.push(ComplianceAlert::info(
                AlertCode::AotcIneligible,
                format!(
                    "Tuition for '{student}' does not qualify for the American opportunity credit"
                ),
            ));
            continue;
        }

        *expenses_by_student.entry(student).or_default() += non_negative(item.amount);
    }

    if expenses_by_student.is_empty() {
        return CreditAmount::default();
    }

    if status == FilingStatus::MarriedFilingSeparately {
        alerts.push(ComplianceAlert::info(
            AlertCode::AotcIneligible,
            "The American opportunity credit is not available when married filing separately",
        ));
        return CreditAmount::default();
    }

    let factor = limits.phaseout.get(status).factor(agi);
    let mut total = CreditAmount::default();

    for expenses in expenses_by_student.values() {
        let full = (*expenses).min(limits.full_credit_expenses);
        let partial = non_negative(*expenses - limits.full_credit_expenses)
            .min(limits.partial_credit_expenses);
        let credit = round_half_up((full + limits.partial_rate * partial) * factor);
        let refundable = round_half_up(credit * limits.refundable_rate).min(limits.refundable_cap);

        total.refundable += refundable;
        total.nonrefundable += credit - refundable;
    }

    total
}

/// Earned income credit from the row for the number of qualifying children.
fn earned_income(
    limits: &EicLimits,
    taxpayer: &TaxPayer,
    input: &CreditInput,
    alerts: &mut Vec<ComplianceAlert>,
) -> Decimal {
    if input.earned_income <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    if taxpayer.filing_status == FilingStatus::MarriedFilingSeparately {
        alerts.push(ComplianceAlert::info(
            AlertCode::EicFilingStatus,
            "The earned income credit is not available when married filing separately",
        ));
        return Decimal::ZERO;
    }

    if input.investment_income > limits.investment_income_limit {
        alerts.push(ComplianceAlert::warning(
            AlertCode::EicInvestmentIncomeLimit,
            format!(
                "Investment income of {} exceeds the {} limit for the earned income credit",
                input.investment_income, limits.investment_income_limit
            ),
        ));
        return Decimal::ZERO;
    }

    let children = taxpayer
        .dependents
        .iter()
        .filter(|dependent| dependent.is_eic_qualifying_child())
        .count();
    let Some(row) = limits.row_for(children) else {
        return Decimal::ZERO;
    };

    let phaseout_start = if taxpayer.filing_status == FilingStatus::MarriedFilingJointly {
        row.phaseout_start_joint
    } else {
        row.phaseout_start
    };

    let credit = input.earned_income.min(row.max_earned_income) * row.credit_rate;
    let reduction = row.phaseout_rate
        * non_negative(input.earned_income.max(input.agi) - phaseout_start);

    round_half_up(non_negative(credit - reduction))
}

/// Child tax credit (with its refundable ACTC portion) and the potential
/// credit for other dependents, after the shared AGI phaseout.
fn child_credits(
    limits: &ChildCreditLimits,
    taxpayer: &TaxPayer,
    input: &CreditInput,
) -> (CreditAmount, Decimal) {
    let children = taxpayer
        .dependents
        .iter()
        .filter(|dependent| dependent.is_ctc_qualifying_child(limits.age_limit))
        .count();
    let others = taxpayer.dependents.len() - children;

    let child_raw = limits.per_child * Decimal::from(children);
    let other_raw = limits.other_dependent * Decimal::from(others);

    // $50 per $1,000 (or fraction) over the threshold
    let excess = non_negative(input.agi - *limits.phaseout_threshold.get(taxpayer.filing_status));
    let steps = (excess / limits.step).ceil();
    let reduction = steps * limits.reduction_per_step;

    // The reduction is taken from the other-dependent credit first
    let other_potential = non_negative(other_raw - reduction);
    let child_potential = non_negative(child_raw - non_negative(reduction - other_raw));

    let refundable = (limits.refundable_rate
        * non_negative(input.earned_income - limits.earned_income_floor))
    .min(limits.refundable_per_child * Decimal::from(children))
    .min(child_potential);
    let refundable = round_half_up(refundable);

    (
        CreditAmount {
            nonrefundable: child_potential - refundable,
            refundable,
        },
        other_potential,
    )
}
