//! Spin history: recorded spins and their durable store.

pub mod store;

pub use store::EventStore;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

/// Default length of the timeout attached to a spin.
pub const DEFAULT_EFFECT_MINUTES: u32 = 2;

/// One recorded spin.
///
/// `member` is the display name at the time of the spin and is never
/// rewritten; `member_id` lets callers resolve the current name later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinEntry {
    pub member: String,
    pub time: DateTime<FixedOffset>,
    /// When the timeout started by this spin expires.
    pub ends_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
}

impl SpinEntry {
    pub fn new(
        member: impl Into<String>,
        member_id: Option<String>,
        time: DateTime<FixedOffset>,
        effect: Duration,
    ) -> Self {
        Self {
            member: member.into(),
            time,
            ends_at: time + effect,
            member_id,
        }
    }

    /// Whether the timeout started by this spin is still running at `now`.
    pub fn is_active_at(&self, now: DateTime<FixedOffset>) -> bool {
        self.time <= now && now < self.ends_at
    }
}
