//! Config command implementation.

use anyhow::Result;

use qop_core::config::Config;

use super::{ConfigAction, ConfigArgs};

/// Run the config command.
pub fn run(args: &ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
        }
        ConfigAction::Init => {
            Config::default().save()?;
            println!("wrote {}", Config::config_path().display());
        }
    }
    Ok(())
}
