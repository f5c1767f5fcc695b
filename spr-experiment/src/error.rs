use std::path::PathBuf;

use spr_core::FormError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StepError {
    /// An event arrived after the last stage completed.
    #[error("the session has already finished")]
    Finished,

    #[error(transparent)]
    Form(#[from] FormError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
