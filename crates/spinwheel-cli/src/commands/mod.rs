pub mod config;
pub mod spin;
