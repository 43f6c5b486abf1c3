//! # Spinwheel Core Library
//!
//! This library provides the core logic for Spinwheel, a shared, rate-limited
//! "spin" that members of a group take turns on. It decides whether a spin is
//! allowed right now, how long until the next one is, and durably records
//! every spin.
//!
//! ## Architecture
//!
//! - **Cooldown Engine**: pull-based state machine; every query recomputes
//!   the remaining cooldown from an injected clock, shortening it during the
//!   daily happy-hour window
//! - **Event Store**: JSON history file with atomic replace-on-write
//! - **Storage**: TOML-based configuration and data directory resolution
//!
//! ## Key Components
//!
//! - [`CooldownEngine`]: spin gate and registration
//! - [`EventStore`]: spin history persistence
//! - [`Clock`] / [`WindowSource`]: injectable time and window collaborators
//! - [`Config`]: application configuration management

pub mod clock;
pub mod cooldown;
pub mod error;
pub mod history;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock, Zone};
pub use cooldown::{
    CooldownEngine, CooldownPolicy, CooldownState, CooldownStatus, EnvWindow, HappyHourWindow,
    WindowSource,
};
pub use error::{ConfigError, CoreError, StoreError};
pub use history::{EventStore, SpinEntry, DEFAULT_EFFECT_MINUTES};
pub use storage::Config;
