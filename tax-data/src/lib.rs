//! Input boundary for the tax engine.
//!
//! - [`brackets`]: rate schedules from CSV using IRS schedule codes
//! - [`profile`]: whole tax-year profiles from TOML
//! - [`extraction`]: defensive normalization of extracted-document JSON
//! - [`scenario`]: JSON scenario files combining the above

pub mod brackets;
pub mod extraction;
pub mod profile;
pub mod scenario;

pub use brackets::{BracketKind, BracketLoader, BracketLoaderError, BracketRecord};
pub use extraction::{Normalized, normalize_document, normalize_records};
pub use profile::{ProfileLoadError, load_profile, parse_profile, to_toml};
pub use scenario::{Scenario, ScenarioError, ScenarioInputs, load_scenario, parse_scenario};
