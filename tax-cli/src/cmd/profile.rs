//! `profile`: print the effective tax-year profile.

use clap::Args;
use tax_data::to_toml;

use super::ProfileArgs;

#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(flatten)]
    profile: ProfileArgs,
}

impl ProfileCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let profile = self.profile.load()?;
        print!("{}", to_toml(&profile)?);
        Ok(())
    }
}
