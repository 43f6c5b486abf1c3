//! `spinwheel config`: inspect and edit `config.toml`.
//!
//! Keys are dot paths into the file, e.g. `happy_hour.start_hour`,
//! `cooldown.standard_minutes`, `cooldown.effect_minutes`,
//! `timezone_offset_hours`, `history_file`. Edits are validated before they
//! are written, so an overnight window or an out-of-range offset never lands
//! on disk.

use clap::Subcommand;
use spinwheel_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Dot path, e.g. "happy_hour.end_hour"
        key: String,
    },
    /// Change one setting and save it
    Set {
        /// Dot path, e.g. "cooldown.happy_hour_minutes"
        key: String,
        /// New value; unset optionals accept a number or a path
        value: String,
    },
    /// Print the whole configuration as JSON
    List,
    /// Overwrite config.toml with the defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            let stored = config.get(&key).unwrap_or(value);
            tracing::debug!(%key, %stored, "setting saved");
            println!("{key} = {stored}");
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config.toml restored to defaults");
        }
    }
    Ok(())
}
