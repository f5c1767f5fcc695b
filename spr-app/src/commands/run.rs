//! The `spr run` command.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use spr_experiment::{OutputFormat, build_session, load_config_from};

use crate::app::App;

pub fn execute(
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let session = build_session(&config, &mut rand::rng());

    let app = App::new(session, config.display.clone())?;
    let data = app.run()?;

    let dir = output.unwrap_or(config.output.dir);
    let format = format.unwrap_or(config.output.format);
    let path = data.write_to_dir(&dir, format)?;

    if config.output.echo {
        let csv = data.to_csv()?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(csv.as_bytes())
            .context("failed to echo results")?;
        stdout.flush()?;
    }
    if !data.session.completed {
        tracing::warn!(path = %path.display(), "session was aborted, partial data saved");
    }
    Ok(())
}
