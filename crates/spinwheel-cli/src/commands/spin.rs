use std::path::PathBuf;

use clap::Subcommand;
use spinwheel_core::{Config, CooldownEngine};

#[derive(Subcommand)]
pub enum SpinAction {
    /// Print cooldown status as JSON
    Status,
    /// Record a spin for a member
    Register {
        /// Display name of the member spinning
        member: String,
        /// Stable member identifier
        #[arg(long)]
        id: Option<String>,
        /// Length of the attached timeout in minutes (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        minutes: Option<u32>,
        /// Record even while the cooldown is running
        #[arg(long)]
        force: bool,
    },
    /// Print recorded spins as JSON, oldest first
    History {
        /// Only the most recent N spins
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print spins whose timeout is still running
    Active,
}

fn open_engine(history: Option<PathBuf>) -> Result<CooldownEngine, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let engine = config.engine(history)?;
    tracing::debug!(path = %engine.store().path().display(), "spin history opened");
    Ok(engine)
}

pub fn run(action: SpinAction, history: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(history)?;

    match action {
        SpinAction::Status => {
            println!("{}", serde_json::to_string_pretty(&engine.status())?);
        }
        SpinAction::Register {
            member,
            id,
            minutes,
            force,
        } => {
            if member.trim().is_empty() {
                return Err("member name must not be empty".into());
            }
            let remaining = engine.seconds_until_next_spin();
            if remaining > 0 && !force {
                return Err(format!("cooldown active: next spin in {remaining}s").into());
            }
            let entry = engine.register_spin(&member, id.as_deref(), minutes);
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        SpinAction::History { limit } => {
            let history = engine.history();
            let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
            println!("{}", serde_json::to_string_pretty(&history[skip..])?);
        }
        SpinAction::Active => {
            println!("{}", serde_json::to_string_pretty(&engine.active_timeouts())?);
        }
    }
    Ok(())
}
