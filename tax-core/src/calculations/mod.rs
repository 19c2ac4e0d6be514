//! Calculation stages of the federal liability pipeline.
//!
//! Each stage is a small calculator borrowing its slice of the
//! [`TaxYearProfile`](crate::TaxYearProfile) and rounding its outputs to
//! cents. [`TaxEngine`](crate::TaxEngine) runs them in order:
//!
//! income → adjustments → passive → deductions → qbi → progressive → amt →
//! credits → surtax → assemble

pub mod adjustments;
pub mod amt;
pub mod assemble;
pub mod common;
pub mod credits;
pub mod deductions;
pub mod income;
pub mod passive;
pub mod progressive;
pub mod qbi;
pub mod surtax;
pub mod worksheets;

pub use worksheets::{SeWorksheet, SeWorksheetConfig, SeWorksheetResult};
