mod config;

pub use config::{Config, CooldownConfig, HappyHourConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable that pins the data directory (tests, containers).
pub const DATA_DIR_VAR: &str = "SPINWHEEL_DATA_DIR";

/// Returns `~/.config/spinwheel[-dev]/` based on SPINWHEEL_ENV.
///
/// Set SPINWHEEL_ENV=dev to use development data directory, or
/// SPINWHEEL_DATA_DIR to use an explicit one.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(DATA_DIR_VAR) {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SPINWHEEL_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("spinwheel-dev")
            } else {
                base_dir.join("spinwheel")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
