//! The `spr validate` command.

use std::path::PathBuf;

use anyhow::Result;
use spr_experiment::{build_timeline, load_config_from};

pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;

    let lints = config.lint();
    for (i, lint) in &lints {
        println!("  warning: sentence {}: {lint}", i + 1);
    }

    let timeline = build_timeline(&config, "XXXXXXXX");
    println!(
        "{} sentences, {} timeline nodes, {} stages",
        config.sentences.len(),
        timeline.len(),
        timeline.stages().len()
    );
    if lints.is_empty() {
        println!("Config valid");
    } else {
        println!("Config valid ({} warnings)", lints.len());
    }
    Ok(())
}
