//! IRS worksheet implementations shared by the pipeline stages.

pub mod self_emp;

pub use self_emp::{SeWorksheet, SeWorksheetConfig, SeWorksheetResult};
