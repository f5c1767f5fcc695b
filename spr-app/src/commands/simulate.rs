//! The `spr simulate` command.

use std::path::PathBuf;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use spr_experiment::{
    OutputFormat, SimulationConfig, build_session, load_config_from, simulate_session,
};

pub fn execute(
    config: Option<PathBuf>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let session = build_session(&config, &mut rng);
    tracing::debug!(stages = session.timeline.stages().len(), "simulating session");
    let data = simulate_session(session, &SimulationConfig::default(), &mut rng)?;

    let dir = output.unwrap_or(config.output.dir);
    let path = data.write_to_dir(&dir, format.unwrap_or(config.output.format))?;
    println!("{}", path.display());
    Ok(())
}
