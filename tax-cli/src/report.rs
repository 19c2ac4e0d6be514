//! Plain-text rendering of a [`TaxResult`].

use std::fmt::Write;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tax_core::{CreditAmount, DeductionKind, FilingStatus, Severity, TaxResult};

const LABEL_WIDTH: usize = 34;

struct Report {
    out: String,
}

impl Report {
    fn section(
        &mut self,
        title: &str,
    ) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        let _ = writeln!(self.out, "{title}");
        let _ = writeln!(self.out, "{}", "-".repeat(title.len()));
    }

    fn line(
        &mut self,
        label: &str,
        value: Decimal,
    ) {
        let amount = format!("{:.2}", value);
        let _ = writeln!(self.out, "  {label:<LABEL_WIDTH$}{amount:>14}");
    }

    /// Like [`Report::line`], skipped when the value is zero.
    fn nonzero(
        &mut self,
        label: &str,
        value: Decimal,
    ) {
        if !value.is_zero() {
            self.line(label, value);
        }
    }

    fn rate(
        &mut self,
        label: &str,
        value: Decimal,
    ) {
        let pct = format!("{:.2}%", value * dec!(100));
        let _ = writeln!(self.out, "  {label:<LABEL_WIDTH$}{pct:>14}");
    }

    fn credit(
        &mut self,
        label: &str,
        amount: &CreditAmount,
    ) {
        if amount.total().is_zero() {
            return;
        }
        self.line(label, amount.nonrefundable);
        if !amount.refundable.is_zero() {
            self.line(&format!("{label} (refundable)"), amount.refundable);
        }
    }
}

/// Renders a result as an aligned, sectioned text report.
pub fn render_text(
    status: FilingStatus,
    result: &TaxResult,
) -> String {
    let mut r = Report { out: String::new() };

    r.section(&format!("Income ({status})"));
    r.nonzero("Wages", result.income.wages);
    r.nonzero("Taxable interest", result.income.taxable_interest);
    r.nonzero("Ordinary dividends", result.income.ordinary_dividends);
    r.nonzero("Capital gain (loss)", result.income.capital_gain);
    r.nonzero("Business income", result.income.business_income);
    r.nonzero("Passive income", result.income.passive_income);
    r.nonzero("Taxable social security", result.income.taxable_social_security);
    r.nonzero("Other income", result.income.other_income);
    r.line("Gross income", result.gross_income);
    r.nonzero("Adjustments", result.adjustments.total);
    r.line("Adjusted gross income", result.agi);

    r.section("Deductions");
    let kind = match result.deductions.kind {
        DeductionKind::Standard => "Standard deduction",
        DeductionKind::Itemized => "Itemized deductions",
    };
    r.line(kind, result.deductions.used);
    r.nonzero("Qualified business income", result.deductions.qbi);
    r.line("Taxable income", result.taxable.total);

    r.section("Tax");
    r.line("Ordinary tax", result.ordinary_tax);
    r.nonzero("Preferential-rate tax", result.preferential_tax);
    r.nonzero("Alternative minimum tax", result.amt);
    r.nonzero("Self-employment tax", result.se_tax);
    r.nonzero("Net investment income tax", result.niit);
    r.nonzero("Additional Medicare tax", result.medicare_surtax);

    if !(result.credits.total_nonrefundable + result.credits.total_refundable).is_zero() {
        r.section("Credits");
        r.credit("Child tax credit", &result.credits.child_tax_credit);
        r.credit("Credit for other dependents", &result.credits.other_dependent_credit);
        r.credit("Earned income credit", &result.credits.earned_income_credit);
        r.credit(
            "American opportunity credit",
            &result.credits.american_opportunity_credit,
        );
        r.credit("Energy credit", &result.credits.energy_credit);
        r.credit("Adoption credit", &result.credits.adoption_credit);
    }

    r.section("Settlement");
    r.line("Total liability", result.total_liability);
    r.line("Total payments", result.total_payments);
    if result.amount_due > Decimal::ZERO {
        r.line("Amount due", result.amount_due);
    } else {
        r.line("Refund", result.refund);
    }
    r.rate("Effective rate", result.effective_rate);
    r.rate("Marginal rate", result.marginal_rate);

    let suspended = &result.carryover.suspended_passive_losses;
    if !suspended.is_empty() || !result.carryover.capital_loss.is_zero() {
        r.section("Carryover");
        for (property, amount) in suspended {
            r.line(&format!("Suspended loss: {property}"), *amount);
        }
        r.nonzero("Capital loss", result.carryover.capital_loss);
        r.nonzero("Charitable contributions", result.carryover.charitable_contributions);
    }

    if !result.alerts.is_empty() {
        r.section("Alerts");
        for alert in &result.alerts {
            let tag = match alert.severity {
                Severity::Info => "info",
                Severity::Warning => "warn",
                Severity::Error => "error",
            };
            let _ = writeln!(r.out, "  [{tag:>5}] {}", alert.message);
        }
    }

    r.out
}
