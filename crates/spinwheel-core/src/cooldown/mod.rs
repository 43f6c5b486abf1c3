mod engine;
mod policy;
mod window;

pub use engine::{CooldownEngine, CooldownState, CooldownStatus};
pub use policy::{hour_boundary, whole_seconds, CooldownPolicy};
pub use window::{EnvWindow, HappyHourWindow, WindowSource, END_HOUR_VAR, START_HOUR_VAR};
