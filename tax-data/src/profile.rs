//! TOML tax-year profiles.
//!
//! A profile file is the serde form of [`TaxYearProfile`]. Everything is
//! validated on the way in, so a loaded profile is always safe to hand to
//! [`tax_core::TaxEngine::new`].

use std::fs;
use std::path::{Path, PathBuf};

use tax_core::{ProfileError, TaxYearProfile};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("profile for {tax_year} is invalid: {source}")]
    Invalid {
        tax_year: i32,
        #[source]
        source: ProfileError,
    },
}

/// Parse and validate a profile from TOML text.
pub fn parse_profile(text: &str) -> Result<TaxYearProfile, ProfileLoadError> {
    let profile: TaxYearProfile = toml::from_str(text)?;
    profile
        .validate()
        .map_err(|source| ProfileLoadError::Invalid {
            tax_year: profile.tax_year,
            source,
        })?;
    debug!(tax_year = profile.tax_year, "parsed tax-year profile");
    Ok(profile)
}

/// Read, parse and validate a profile file.
pub fn load_profile(path: &Path) -> Result<TaxYearProfile, ProfileLoadError> {
    let text = fs::read_to_string(path).map_err(|source| ProfileLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let profile = parse_profile(&text)?;
    info!(
        path = %path.display(),
        tax_year = profile.tax_year,
        "loaded tax-year profile"
    );
    Ok(profile)
}

/// Render a profile as TOML. The output parses back with [`parse_profile`].
pub fn to_toml(profile: &TaxYearProfile) -> Result<String, ProfileLoadError> {
    Ok(toml::to_string_pretty(profile)?)
}
