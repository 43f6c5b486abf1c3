//! Cooldown engine.
//!
//! Holds the authoritative cooldown state for one group and decides whether
//! a spin is allowed. There is no timer thread: every query recomputes from
//! the injected clock.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --register_spin--> CoolingDown --(wall clock passes)--> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = CooldownEngine::new(store, clock, window);
//! if engine.can_spin() {
//!     engine.register_spin("alice", Some("42"), None);
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use super::policy::{hour_boundary, whole_seconds, CooldownPolicy};
use super::window::{HappyHourWindow, WindowSource};
use crate::clock::Clock;
use crate::history::{EventStore, SpinEntry, DEFAULT_EFFECT_MINUTES};

/// In-memory cooldown state, mirrored to the [`EventStore`].
#[derive(Debug, Clone, Default)]
pub struct CooldownState {
    pub last_spin: Option<DateTime<FixedOffset>>,
    pub history: Vec<SpinEntry>,
}

impl CooldownState {
    /// Rebuild state from a loaded history; `last_spin` is the last entry's time.
    pub fn from_history(history: Vec<SpinEntry>) -> Self {
        Self {
            last_spin: history.last().map(|e| e.time),
            history,
        }
    }
}

/// Point-in-time view of the cooldown, for outer interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooldownStatus {
    pub can_spin: bool,
    pub seconds_remaining: u64,
    pub in_happy_hour: bool,
    pub last_spin: Option<DateTime<FixedOffset>>,
    pub next_spin_at: DateTime<FixedOffset>,
    pub window: Option<HappyHourWindow>,
    pub at: DateTime<FixedOffset>,
}

/// Shared, rate-limited spin gate.
///
/// Safe to share across threads behind an `Arc`; registrations are
/// serialized through the internal lock.
pub struct CooldownEngine {
    state: Mutex<CooldownState>,
    store: EventStore,
    clock: Arc<dyn Clock>,
    window: Arc<dyn WindowSource>,
    policy: CooldownPolicy,
    effect: Duration,
}

impl std::fmt::Debug for CooldownEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownEngine")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CooldownEngine {
    /// Create an engine hydrated from `store`.
    ///
    /// An unreadable store yields an empty history and no active cooldown.
    pub fn new(store: EventStore, clock: Arc<dyn Clock>, window: Arc<dyn WindowSource>) -> Self {
        let state = CooldownState::from_history(store.load_history());
        tracing::debug!(
            entries = state.history.len(),
            last_spin = ?state.last_spin,
            "cooldown state hydrated"
        );
        Self {
            state: Mutex::new(state),
            store,
            clock,
            window,
            policy: CooldownPolicy::default(),
            effect: Duration::minutes(DEFAULT_EFFECT_MINUTES.into()),
        }
    }

    /// Override the cooldown durations.
    pub fn with_policy(mut self, policy: CooldownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the default timeout attached to a spin.
    pub fn with_default_effect(mut self, minutes: u32) -> Self {
        self.effect = Duration::minutes(minutes.into());
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn policy(&self) -> CooldownPolicy {
        self.policy
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn last_spin(&self) -> Option<DateTime<FixedOffset>> {
        self.lock_state().last_spin
    }

    /// Snapshot of the in-memory history, oldest first.
    pub fn history(&self) -> Vec<SpinEntry> {
        self.lock_state().history.clone()
    }

    /// Whether `now` falls inside the happy-hour window.
    ///
    /// A window source that cannot produce a window means "not happy hour".
    pub fn is_happy_hour(&self, now: DateTime<FixedOffset>) -> bool {
        self.window.window().is_some_and(|w| w.contains(&now))
    }

    /// Seconds until the next spin is allowed; 0 when a spin is allowed now.
    pub fn seconds_until_next_spin(&self) -> u64 {
        let last_spin = self.lock_state().last_spin;
        let now = self.clock.now();
        whole_seconds(self.remaining_at(last_spin, now))
    }

    pub fn can_spin(&self) -> bool {
        self.seconds_until_next_spin() == 0
    }

    pub fn status(&self) -> CooldownStatus {
        let last_spin = self.lock_state().last_spin;
        let now = self.clock.now();
        let window = self.window.window();
        let seconds_remaining = whole_seconds(self.remaining_at(last_spin, now));
        CooldownStatus {
            can_spin: seconds_remaining == 0,
            seconds_remaining,
            in_happy_hour: window.is_some_and(|w| w.contains(&now)),
            last_spin,
            next_spin_at: now + Duration::seconds(seconds_remaining as i64),
            window,
            at: now,
        }
    }

    /// Entries whose timeout is still running.
    pub fn active_timeouts(&self) -> Vec<SpinEntry> {
        let now = self.clock.now();
        self.lock_state()
            .history
            .iter()
            .filter(|e| e.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Most recent display name recorded for `member_id`.
    pub fn latest_name_for(&self, member_id: &str) -> Option<String> {
        self.lock_state()
            .history
            .iter()
            .rev()
            .find(|e| e.member_id.as_deref() == Some(member_id))
            .map(|e| e.member.clone())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record a spin made now and start its cooldown.
    ///
    /// `minutes` sets the attached timeout (engine default when `None`).
    /// Persistence is best-effort: a store failure is logged and the
    /// in-memory cooldown still applies.
    pub fn register_spin(
        &self,
        member_name: &str,
        member_id: Option<&str>,
        minutes: Option<u32>,
    ) -> SpinEntry {
        let effect = minutes
            .map(|m| Duration::minutes(m.into()))
            .unwrap_or(self.effect);

        let mut state = self.lock_state();
        let now = self.clock.now();
        let entry = SpinEntry::new(member_name, member_id.map(str::to_string), now, effect);

        state.last_spin = Some(now);
        state.history.push(entry.clone());
        tracing::debug!(member = member_name, at = %now, "spin registered");

        // Store lock is taken while holding the state lock so disk order
        // matches in-memory order.
        if let Err(e) = self.store.append_entry(&entry) {
            tracing::warn!(error = %e, "spin recorded in memory only");
        }

        entry
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn remaining_at(
        &self,
        last_spin: Option<DateTime<FixedOffset>>,
        now: DateTime<FixedOffset>,
    ) -> Duration {
        let Some(last_spin) = last_spin else {
            return Duration::zero();
        };
        let clock = self.clock.as_ref();
        self.policy
            .remaining(last_spin, now, self.window.window(), |hour| {
                hour_boundary(clock, now, hour)
            })
    }

    fn lock_state(&self) -> MutexGuard<'_, CooldownState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
