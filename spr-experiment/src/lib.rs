pub mod builder;
pub mod config;
pub mod data;
pub mod error;
pub mod simulate;
pub mod state;
pub mod timeline;

pub use builder::{TrialBuilder, make_spr_trial};
pub use config::{ExperimentConfig, load_config_from};
pub use data::{DataSet, OutputFormat, SessionInfo};
pub use error::{ConfigError, ExportError, StepError};
pub use simulate::{SimulationConfig, simulate_session};
pub use state::{ExperimentEvent, ExperimentStateMachine, Transition};
pub use timeline::{Session, build_session, build_timeline};
