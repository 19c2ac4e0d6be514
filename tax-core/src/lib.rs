//! Federal individual income tax liability engine.
//!
//! Takes a taxpayer profile plus typed income and deduction records and
//! produces a complete [`TaxResult`]: gross income, AGI, deductions, regular
//! tax, AMT, credits, surtaxes, the refund or balance due, and compliance
//! alerts. All year-specific law lives in an injected [`TaxYearProfile`].

pub mod calculations;
pub mod engine;
pub mod models;

pub use engine::TaxEngine;
pub use models::*;

/// Computes a return with the built-in 2025 profile.
pub fn compute(
    taxpayer: &TaxPayer,
    income: &[IncomeItem],
    deductions: &[DeductionItem],
) -> TaxResult {
    TaxEngine::default().compute(taxpayer, income, deductions)
}
