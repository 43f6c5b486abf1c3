//! Cooldown arithmetic across happy-hour boundaries.
//!
//! ## Rules
//!
//! - Outside happy hour the standard cooldown applies (default 60 min).
//! - Inside happy hour the short cooldown applies (default 5 min).
//! - A spin made before happy hour opens is released early once the window
//!   opens, so that at most one short cooldown is waited across the
//!   transition.
//! - A spin whose short cooldown would run past the end of happy hour is
//!   held to the standard cooldown instead.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};

use super::window::HappyHourWindow;
use crate::clock::Clock;

/// Cooldown durations for the two pricing periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub standard: Duration,
    pub happy_hour: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            standard: Duration::minutes(60),
            happy_hour: Duration::minutes(5),
        }
    }
}

impl CooldownPolicy {
    pub fn from_minutes(standard: u32, happy_hour: u32) -> Self {
        Self {
            standard: Duration::minutes(standard.into()),
            happy_hour: Duration::minutes(happy_hour.into()),
        }
    }

    /// Cooldown in force at `now`.
    pub fn cooldown_at(&self, in_happy_hour: bool) -> Duration {
        if in_happy_hour {
            self.happy_hour
        } else {
            self.standard
        }
    }

    /// Time left before the next spin is allowed, never negative.
    ///
    /// `boundary(hour)` resolves "today at `hour`:00:00" in the civil zone of
    /// `now`; `None` skips the boundary adjustment for that edge.
    pub fn remaining<F>(
        &self,
        last_spin: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
        window: Option<HappyHourWindow>,
        boundary: F,
    ) -> Duration
    where
        F: Fn(u32) -> Option<DateTime<FixedOffset>>,
    {
        let in_happy_hour = window.is_some_and(|w| w.contains(&now));
        let elapsed = now - last_spin;
        let mut remaining = self.cooldown_at(in_happy_hour) - elapsed;

        if remaining <= Duration::zero() {
            return Duration::zero();
        }

        match window {
            Some(window) if !in_happy_hour => {
                if let Some(start) = boundary(window.start_hour()) {
                    // Only a window that has yet to open today can shorten the wait.
                    if now < start && last_spin < start && start <= now + remaining {
                        let until_start = start - now;
                        remaining = if until_start > self.happy_hour {
                            until_start
                        } else {
                            self.happy_hour - until_start
                        };
                    }
                }
            }
            Some(window) => {
                if let Some(end) = boundary(window.end_hour()) {
                    if last_spin + self.happy_hour > end {
                        remaining = self.standard - elapsed;
                    }
                }
            }
            None => {}
        }

        remaining.max(Duration::zero())
    }
}

/// "Today at `hour`:00:00" for the calendar day of `now`, localized by `clock`.
///
/// `hour` may be 24, meaning the following midnight.
pub fn hour_boundary(
    clock: &dyn Clock,
    now: DateTime<FixedOffset>,
    hour: u32,
) -> Option<DateTime<FixedOffset>> {
    let midnight: NaiveDateTime = now.date_naive().and_hms_opt(0, 0, 0)?;
    let naive = midnight.checked_add_signed(Duration::hours(hour.into()))?;
    clock
        .localize(naive)
        .or_else(|| naive.and_local_timezone(*now.offset()).single())
}

/// Whole seconds in `remaining`, rounded down and clamped to zero.
pub fn whole_seconds(remaining: Duration) -> u64 {
    u64::try_from(remaining.num_seconds()).unwrap_or(0)
}
