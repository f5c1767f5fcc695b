//! The `spr timeline` command.

use std::path::PathBuf;

use anyhow::Result;
use spr_experiment::{build_session, load_config_from};

pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let session = build_session(&config, &mut rand::rng());
    let json = serde_json::to_string_pretty(&session.timeline.to_runner_json())?;
    println!("{json}");
    Ok(())
}
