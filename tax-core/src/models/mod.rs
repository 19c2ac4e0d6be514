mod alert;
mod deduction;
mod filing_status;
mod income;
mod tax_bracket;
mod tax_result;
mod tax_year_profile;
mod taxpayer;

pub use alert::{AlertCode, ComplianceAlert, Severity};
pub use deduction::{DeductionDetail, DeductionItem, HsaCoverage, SaltKind};
pub use filing_status::FilingStatus;
pub use income::{HoldingPeriod, IncomeDetail, IncomeItem};
pub use tax_bracket::TaxBracket;
pub use tax_result::{
    AdjustmentSummary, CarryoverSnapshot, CreditAmount, CreditSummary, DeductionKind,
    DeductionSummary, IncomeSummary, MagiVariants, TaxResult, TaxableIncomeBreakdown,
};
pub use tax_year_profile::{
    AdjustmentLimits, AdoptionLimits, AmtLimits, AotcLimits, BenefitBase, CapitalGainLimits,
    ChildCreditLimits, CreditLimits, DeductionLimits, EicLimits, EicRow, PassiveLossLimits,
    PhaseoutRange, ProfileError, QbiLimits, SocialSecurityLimits, StatusTable, SurtaxLimits,
    TaxYearProfile, WashSaleTreatment,
};
pub use taxpayer::{Dependent, Relationship, TaxPayer};
