//! Happy-hour window definition and sources.

use chrono::{DateTime, TimeZone, Timelike};
use serde::Serialize;

use crate::error::ConfigError;

/// Environment variable holding the first happy-hour hour (inclusive).
pub const START_HOUR_VAR: &str = "START_HOUR_HAPPY_HOUR";
/// Environment variable holding the hour happy hour ends (exclusive).
pub const END_HOUR_VAR: &str = "END_HOUR_HAPPY_HOUR";

/// Daily local-time window `[start_hour, end_hour)` with a shortened cooldown.
///
/// The window never wraps past midnight: `start_hour < end_hour` and
/// `end_hour <= 24`, so a window ending at midnight is written `[23, 24)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HappyHourWindow {
    start_hour: u32,
    end_hour: u32,
}

impl HappyHourWindow {
    pub const DEFAULT: Self = Self {
        start_hour: 17,
        end_hour: 18,
    };

    /// # Errors
    /// Returns `ConfigError::InvalidValue` for hours past midnight or an
    /// overnight/empty window.
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, ConfigError> {
        if start_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "happy_hour.start_hour".into(),
                message: format!("{start_hour} is not an hour of the day"),
            });
        }
        if end_hour > 24 {
            return Err(ConfigError::InvalidValue {
                key: "happy_hour.end_hour".into(),
                message: format!("{end_hour} is past midnight"),
            });
        }
        if start_hour >= end_hour {
            return Err(ConfigError::InvalidValue {
                key: "happy_hour".into(),
                message: format!(
                    "window [{start_hour}, {end_hour}) is empty or wraps past midnight"
                ),
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }

    pub fn contains<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        self.contains_hour(at.hour())
    }
}

impl Default for HappyHourWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Supplies the happy-hour window at decision time.
///
/// `None` means the window could not be determined; callers treat that as
/// "not happy hour".
pub trait WindowSource: Send + Sync {
    fn window(&self) -> Option<HappyHourWindow>;
}

impl WindowSource for HappyHourWindow {
    fn window(&self) -> Option<HappyHourWindow> {
        Some(*self)
    }
}

/// Reads [`START_HOUR_VAR`] / [`END_HOUR_VAR`] on every call.
///
/// Unset variables take the fallback's hour; unparsable or invalid values
/// fall back to the whole fallback window.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvWindow {
    fallback: HappyHourWindow,
}

impl EnvWindow {
    pub fn new(fallback: HappyHourWindow) -> Self {
        Self { fallback }
    }

    /// Resolve a window from raw variable values.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        fallback: HappyHourWindow,
    ) -> HappyHourWindow {
        let parse = |raw: Option<&str>, default: u32| match raw {
            Some(value) => value.trim().parse::<u32>().ok(),
            None => Some(default),
        };

        let (Some(start_hour), Some(end_hour)) = (
            parse(start, fallback.start_hour),
            parse(end, fallback.end_hour),
        ) else {
            tracing::warn!(?start, ?end, "unparsable happy-hour hours, using fallback");
            return fallback;
        };

        HappyHourWindow::new(start_hour, end_hour).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "rejected happy-hour window, using fallback");
            fallback
        })
    }
}

impl WindowSource for EnvWindow {
    fn window(&self) -> Option<HappyHourWindow> {
        let start = std::env::var(START_HOUR_VAR).ok();
        let end = std::env::var(END_HOUR_VAR).ok();
        Some(Self::resolve(start.as_deref(), end.as_deref(), self.fallback))
    }
}
