pub mod compute;
pub mod normalize;
pub mod profile;

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use tax_core::{TaxEngine, TaxYearProfile};
use tax_data::{BracketLoader, load_profile};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Where the tax-year parameters come from.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// TOML tax-year profile (defaults to the built-in 2025 profile)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// CSV rate schedules replacing the profile's brackets
    #[arg(long)]
    pub brackets: Option<PathBuf>,
}

impl ProfileArgs {
    pub fn load(&self) -> anyhow::Result<TaxYearProfile> {
        let mut profile = match &self.profile {
            Some(path) => load_profile(path)?,
            None => TaxYearProfile::tax_year_2025(),
        };

        if let Some(path) = &self.brackets {
            let file = File::open(path)
                .with_context(|| format!("cannot open bracket file '{}'", path.display()))?;
            let records = BracketLoader::parse(file)
                .with_context(|| format!("cannot parse bracket file '{}'", path.display()))?;
            let replaced = BracketLoader::apply(&mut profile, &records)
                .with_context(|| format!("cannot apply bracket file '{}'", path.display()))?;
            info!(
                path = %path.display(),
                schedules = replaced,
                "applied bracket schedules"
            );
        }

        Ok(profile)
    }

    pub fn engine(&self) -> anyhow::Result<TaxEngine> {
        TaxEngine::new(self.load()?).context("tax-year profile is invalid")
    }
}

/// Reads a whole input file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .lock()
            .read_to_string(&mut buffer)
            .context("cannot read stdin")?;
        if buffer.trim().is_empty() {
            bail!("No input received. Provide a file or pipe data to stdin.");
        }
        Ok(buffer)
    } else {
        fs::read_to_string(path).with_context(|| format!("cannot read '{}'", path.display()))
    }
}
