//! Current-time sources.
//!
//! Every cooldown decision is computed from a [`Clock`] reading in the
//! configured civil timezone. Production code uses [`SystemClock`]; tests and
//! simulations drive a [`ManualClock`] across window boundaries without
//! waiting on the wall clock.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::ConfigError;

/// Source of "now" in the configured civil timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Attach the configured zone to a wall-clock reading.
    ///
    /// Returns `None` when the local time does not exist (DST gap).
    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.now().offset().from_local_datetime(&naive).single()
    }
}

/// Civil timezone used by [`SystemClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The operating system's local zone (honours `TZ`).
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

/// Wall clock reading the system time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: Zone,
}

impl SystemClock {
    pub fn local() -> Self {
        Self { zone: Zone::Local }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            zone: Zone::Fixed(offset),
        }
    }

    /// Build a clock from a whole-hour UTC offset, e.g. `2` for CEST.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` when the offset is outside ±23h.
    pub fn with_offset_hours(hours: i32) -> Result<Self, ConfigError> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self::fixed)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "timezone_offset_hours".into(),
                message: format!("{hours} is not a valid UTC offset"),
            })
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::local()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.zone {
            Zone::Local => Local::now().fixed_offset(),
            Zone::Fixed(offset) => Utc::now().with_timezone(&offset),
        }
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self.zone {
            // Ambiguous (DST fold) readings resolve to the first occurrence.
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Zone::Fixed(offset) => offset.from_local_datetime(&naive).single(),
        }
    }
}

/// Settable clock for deterministic tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn paris_summer() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[test]
    fn fixed_clock_reports_configured_offset() {
        let clock = SystemClock::with_offset_hours(2).unwrap();
        assert_eq!(clock.now().offset(), &paris_summer());
    }

    #[test]
    fn rejects_out_of_range_offset() {
        assert!(SystemClock::with_offset_hours(24).is_err());
        assert!(SystemClock::with_offset_hours(-30).is_err());
        assert!(SystemClock::with_offset_hours(-12).is_ok());
    }

    #[test]
    fn manual_clock_advances() {
        let start = paris_summer()
            .with_ymd_and_hms(2025, 6, 1, 16, 50, 0)
            .unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(15));
        assert_eq!(clock.now().hour(), 17);
        assert_eq!(clock.now().minute(), 5);
    }

    #[test]
    fn localize_uses_clock_offset() {
        let clock = ManualClock::new(
            paris_summer()
                .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
                .unwrap(),
        );
        let naive = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();
        let local = clock.localize(naive).unwrap();
        assert_eq!(local.offset(), &paris_summer());
        assert_eq!(local.hour(), 17);
    }
}
