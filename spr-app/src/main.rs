//! spr: self-paced reading experiments from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use spr_experiment::OutputFormat;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod input;

const DEFAULT_LOG_FILTER: &str = "spr=info,spr_experiment=info,spr_render=info";

#[derive(Parser)]
#[command(name = "spr", version, about = "Self-paced reading experiment runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session in a window
    Run {
        /// Experiment config (defaults to ./spr.toml, then the built-in study)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Results directory, overrides output.dir
        #[arg(long)]
        output: Option<PathBuf>,

        /// Results format: csv or json, overrides output.format
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print the assembled timeline as runner JSON
    Timeline {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a config file and report sentence spacing problems
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a starter spr.toml
    Init {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Run a session headless with a simulated participant
    Simulate {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for the completion code and the simulated reading times
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        format: Option<OutputFormat>,
    },
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            output,
            format,
        } => commands::run::execute(config, output, format),
        Commands::Timeline { config } => commands::timeline::execute(config),
        Commands::Validate { config } => commands::validate::execute(config),
        Commands::Init { output } => commands::init::execute(output),
        Commands::Simulate {
            config,
            seed,
            output,
            format,
        } => commands::simulate::execute(config, seed, output, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
