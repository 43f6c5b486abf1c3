//! Integration tests for the cooldown engine.
//!
//! Drives a manual clock through the happy-hour boundaries and checks the
//! engine against its persisted history across restarts.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use proptest::prelude::*;
use spinwheel_core::{CooldownEngine, EventStore, HappyHourWindow, ManualClock};
use tempfile::TempDir;

fn paris(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 6, 20, h, m, s)
        .unwrap()
}

struct Harness {
    _dir: TempDir,
    path: std::path::PathBuf,
    clock: Arc<ManualClock>,
    engine: CooldownEngine,
}

impl Harness {
    fn new(now: DateTime<FixedOffset>) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeouts.json");
        let clock = Arc::new(ManualClock::new(now));
        let engine = Self::open(&path, &clock);
        Self {
            _dir: dir,
            path,
            clock,
            engine,
        }
    }

    fn open(path: &std::path::Path, clock: &Arc<ManualClock>) -> CooldownEngine {
        let store = EventStore::new(path, clock.clone());
        CooldownEngine::new(store, clock.clone(), Arc::new(HappyHourWindow::DEFAULT))
    }

    fn spin_at(&self, at: DateTime<FixedOffset>) {
        self.clock.set(at);
        self.engine.register_spin("alice", None, None);
    }

    fn remaining_at(&self, at: DateTime<FixedOffset>) -> u64 {
        self.clock.set(at);
        self.engine.seconds_until_next_spin()
    }

    fn restart(&mut self) {
        self.engine = Self::open(&self.path, &self.clock);
    }
}

#[test]
fn test_standard_cooldown_scenario() {
    let h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(10, 0, 0));
    assert_eq!(h.remaining_at(paris(10, 30, 0)), 1800);
}

#[test]
fn test_happy_hour_scenario() {
    let h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(17, 10, 0));
    assert_eq!(h.remaining_at(paris(17, 12, 0)), 180);
    assert!(!h.engine.can_spin());
    assert_eq!(h.remaining_at(paris(17, 15, 0)), 0);
    assert!(h.engine.can_spin());
}

#[test]
fn test_pre_happy_hour_boundary_scenario() {
    let h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(16, 50, 0));
    assert_eq!(h.remaining_at(paris(16, 55, 0)), 0);
    assert!(h.engine.can_spin());
    assert_eq!(h.remaining_at(paris(17, 0, 0)), 0);
}

#[test]
fn test_happy_hour_ending_scenario() {
    let h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(17, 58, 0));
    // Standard cooldown minus one elapsed minute.
    assert_eq!(h.remaining_at(paris(17, 59, 0)), 59 * 60);
    assert_eq!(h.remaining_at(paris(18, 30, 0)), 28 * 60);
    assert_eq!(h.remaining_at(paris(18, 58, 0)), 0);
}

#[test]
fn test_spin_during_window_with_room_to_spare() {
    let h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(17, 54, 0));
    // 17:54 + 5 min = 17:59, still inside the window.
    assert_eq!(h.remaining_at(paris(17, 56, 0)), 3 * 60);
}

#[test]
fn test_cooldown_survives_restart() {
    let mut h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(10, 0, 0));
    h.clock.set(paris(10, 20, 0));
    h.restart();

    assert_eq!(h.engine.last_spin(), Some(paris(10, 0, 0)));
    assert_eq!(h.engine.history().len(), 1);
    assert_eq!(h.engine.seconds_until_next_spin(), 40 * 60);
}

#[test]
fn test_corrupt_history_clears_cooldown() {
    let mut h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(10, 0, 0));
    std::fs::write(&h.path, "not json at all").unwrap();
    h.restart();

    assert!(h.engine.can_spin());
    assert!(h.engine.history().is_empty());
}

#[test]
fn test_malformed_entry_keeps_valid_history() {
    let mut h = Harness::new(paris(9, 0, 0));
    std::fs::write(
        &h.path,
        r#"{"history": [
            {"member": "a", "time": "2025-06-20T09:30:00+02:00", "ends_at": "2025-06-20T09:32:00+02:00"},
            {"member": "b", "time": "2025-06-20T10:15:00+02:00", "ends_at": "2025-06-20T10:17:00+02:00"},
            {"member": "c", "time": "2025-06-20 12:00", "ends_at": "2025-06-20T12:02:00+02:00"}
        ]}"#,
    )
    .unwrap();
    h.clock.set(paris(10, 45, 0));
    h.restart();

    assert_eq!(h.engine.history().len(), 2);
    assert_eq!(h.engine.last_spin(), Some(paris(10, 15, 0)));
    assert_eq!(h.engine.seconds_until_next_spin(), 30 * 60);

    h.spin_at(paris(11, 30, 0));
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&h.path).unwrap()).unwrap();
    assert_eq!(on_disk["history"].as_array().unwrap().len(), 4);

    h.restart();
    let members: Vec<_> = h.engine.history().into_iter().map(|e| e.member).collect();
    assert_eq!(members, ["a", "b", "alice"]);
}

#[test]
fn test_concurrent_registrations_are_all_recorded() {
    let h = Harness::new(paris(10, 0, 0));
    let engine = Arc::new(h.engine);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..5 {
                    let id = format!("{t}-{i}");
                    engine.register_spin(&format!("member {id}"), Some(id.as_str()), None);
                    let _ = engine.seconds_until_next_spin();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.history().len(), 40);
    let stored = EventStore::new(&h.path, h.clock.clone()).load_history();
    assert_eq!(stored, engine.history());
    assert!(!engine.can_spin());
}

#[test]
fn test_registration_advances_last_spin() {
    let h = Harness::new(paris(9, 0, 0));
    h.spin_at(paris(9, 0, 0));
    h.clock.advance(Duration::hours(2));
    assert!(h.engine.can_spin());
    h.engine.register_spin("bob", Some("b"), Some(7));

    assert_eq!(h.engine.last_spin(), Some(paris(11, 0, 0)));
    assert_eq!(h.engine.seconds_until_next_spin(), 3600);
    assert_eq!(h.engine.latest_name_for("b").as_deref(), Some("bob"));
}

proptest! {
    #[test]
    fn remaining_never_increases_outside_happy_hour(
        spin_min in 0u32..(15 * 60),
        a in 0i64..3600,
        b in 0i64..3600,
    ) {
        let h = Harness::new(paris(0, 0, 0));
        let spin = paris(0, 0, 0) + Duration::minutes(spin_min.into());
        h.spin_at(spin);

        let (t1, t2) = (a.min(b), a.max(b));
        let first = h.remaining_at(spin + Duration::seconds(t1));
        let second = h.remaining_at(spin + Duration::seconds(t2));
        prop_assert!(second <= first);
        prop_assert!(first <= 3600);
    }

    #[test]
    fn remaining_never_increases_inside_happy_hour(
        spin_sec in 0i64..(50 * 60),
        a in 0i64..300,
        b in 0i64..300,
    ) {
        let h = Harness::new(paris(0, 0, 0));
        let spin = paris(17, 0, 0) + Duration::seconds(spin_sec);
        h.spin_at(spin);

        let (t1, t2) = (a.min(b), a.max(b));
        let first = h.remaining_at(spin + Duration::seconds(t1));
        let second = h.remaining_at(spin + Duration::seconds(t2));
        prop_assert!(second <= first);
        prop_assert!(first <= 300);
    }

    #[test]
    fn registering_always_blocks_immediately(hour in 0u32..24, minute in 0u32..60) {
        // A spin exactly one short cooldown before the window opens is
        // released on the spot.
        prop_assume!(!(hour == 16 && minute == 55));
        let h = Harness::new(paris(0, 0, 0));
        h.spin_at(paris(hour, minute, 0));
        prop_assert!(!h.engine.can_spin());
        prop_assert!(h.engine.seconds_until_next_spin() > 0);
    }
}
