//! TOML-based application configuration.
//!
//! Stores:
//! - Happy-hour window hours
//! - Standard and happy-hour cooldown lengths
//! - Default timeout attached to a spin
//! - Civil timezone offset and history file location
//!
//! Configuration is stored at `~/.config/spinwheel/config.toml`.
//! `START_HOUR_HAPPY_HOUR` / `END_HOUR_HAPPY_HOUR` override the window hours
//! at decision time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use super::data_dir;
use crate::clock::{Clock, SystemClock};
use crate::cooldown::{CooldownEngine, CooldownPolicy, EnvWindow, HappyHourWindow};
use crate::error::{ConfigError, CoreError};
use crate::history::store::HISTORY_FILE_NAME;
use crate::history::{EventStore, DEFAULT_EFFECT_MINUTES};

/// Happy-hour window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HappyHourConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
}

/// Cooldown lengths, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    #[serde(default = "default_standard_minutes")]
    pub standard_minutes: u32,
    #[serde(default = "default_happy_hour_minutes")]
    pub happy_hour_minutes: u32,
    /// Timeout attached to a spin when the caller gives none.
    #[serde(default = "default_effect_minutes")]
    pub effect_minutes: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/spinwheel/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Whole-hour UTC offset; system local zone when unset.
    #[serde(default)]
    pub timezone_offset_hours: Option<i32>,
    /// History file; `<data dir>/timeouts.json` when unset.
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    #[serde(default)]
    pub happy_hour: HappyHourConfig,
    #[serde(default)]
    pub cooldown: CooldownConfig,
}

fn default_start_hour() -> u32 {
    17
}
fn default_end_hour() -> u32 {
    18
}
fn default_standard_minutes() -> u32 {
    60
}
fn default_happy_hour_minutes() -> u32 {
    5
}
fn default_effect_minutes() -> u32 {
    DEFAULT_EFFECT_MINUTES
}

impl Default for HappyHourConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            standard_minutes: default_standard_minutes(),
            happy_hour_minutes: default_happy_hour_minutes(),
            effect_minutes: default_effect_minutes(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || ConfigError::UnknownKey(key.to_string());

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    // Unset optionals: numbers stay numbers, anything else is a string.
                    serde_json::Value::Null => match value.parse::<i64>() {
                        Ok(n) => serde_json::Value::Number(n.into()),
                        Err(_) => serde_json::Value::String(value.into()),
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the result is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value is invalid,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check every value that has a constrained range.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window()?;
        self.clock()?;
        if self.cooldown.happy_hour_minutes > self.cooldown.standard_minutes {
            return Err(ConfigError::InvalidValue {
                key: "cooldown.happy_hour_minutes".into(),
                message: "must not exceed cooldown.standard_minutes".into(),
            });
        }
        Ok(())
    }

    /// Configured happy-hour window.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range or overnight window.
    pub fn window(&self) -> Result<HappyHourWindow, ConfigError> {
        HappyHourWindow::new(self.happy_hour.start_hour, self.happy_hour.end_hour)
    }

    /// Clock in the configured civil timezone.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid UTC offset.
    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        match self.timezone_offset_hours {
            Some(hours) => SystemClock::with_offset_hours(hours),
            None => Ok(SystemClock::local()),
        }
    }

    pub fn policy(&self) -> CooldownPolicy {
        CooldownPolicy::from_minutes(
            self.cooldown.standard_minutes,
            self.cooldown.happy_hour_minutes,
        )
    }

    /// Resolved history file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn history_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.history_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(HISTORY_FILE_NAME)),
        }
    }

    /// Build a cooldown engine wired to the system clock, the environment
    /// window overrides and the configured store.
    ///
    /// `history_override` replaces the configured history file.
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone offset is invalid or the history
    /// location cannot be resolved. An invalid window falls back to 17-18.
    pub fn engine(&self, history_override: Option<PathBuf>) -> Result<CooldownEngine, CoreError> {
        let clock: Arc<dyn Clock> = Arc::new(self.clock()?);
        let window = self.window().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid configured happy hour, using default");
            HappyHourWindow::DEFAULT
        });
        let path = match history_override {
            Some(path) => path,
            None => self.history_path()?,
        };

        let store = EventStore::new(path, clock.clone());
        Ok(CooldownEngine::new(store, clock, Arc::new(EnvWindow::new(window)))
            .with_policy(self.policy())
            .with_default_effect(self.cooldown.effect_minutes))
    }
}
