//! The `spr init` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use spr_experiment::ExperimentConfig;
use spr_experiment::config::DEFAULT_CONFIG_FILE;

pub fn execute(output: PathBuf) -> Result<()> {
    let path = output.join(DEFAULT_CONFIG_FILE);
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let toml = ExperimentConfig::default().to_toml_string()?;
    std::fs::write(&path, format!("{HEADER}{toml}"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());

    println!("\nNext steps:");
    println!("  1. Edit the sentences and questions in {DEFAULT_CONFIG_FILE}");
    println!("  2. Run: spr validate --config {}", path.display());
    println!("  3. Run: spr run --config {}", path.display());
    Ok(())
}

const HEADER: &str = "# spr experiment configuration
#
# Sentences are split on single spaces exactly as written.
# `spr validate` warns about doubled, leading or trailing spaces.

";
