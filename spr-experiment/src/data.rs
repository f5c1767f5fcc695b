use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spr_core::{ResponseRecord, StageKind};

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format `{other}` (expected csv or json)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub completion_code: String,
    /// False when the session was aborted before the last stage.
    pub completed: bool,
}

impl SessionInfo {
    pub fn new(completion_code: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            completion_code: completion_code.into(),
            completed: false,
        }
    }
}

/// Everything recorded during one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub session: SessionInfo,
    pub records: Vec<ResponseRecord>,
}

impl DataSet {
    pub fn new(session: SessionInfo) -> Self {
        Self {
            session,
            records: Vec::new(),
        }
    }

    /// Records of stages of the given kind, in presentation order.
    pub fn of_kind(&self, kind: StageKind) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(move |r| r.stage == kind)
    }

    /// Reading times of one sentence, word by word.
    pub fn reading_times(&self, sentence: usize) -> Vec<f64> {
        self.of_kind(StageKind::Word)
            .filter(|r| r.sentence_index == Some(sentence))
            .filter_map(|r| r.rt_ms)
            .collect()
    }

    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for record in &self.records {
            wtr.serialize(record)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn encode(&self, format: OutputFormat) -> Result<String, ExportError> {
        match format {
            OutputFormat::Csv => self.to_csv(),
            OutputFormat::Json => self.to_json(),
        }
    }

    pub fn file_name(&self, format: OutputFormat) -> String {
        format!(
            "spr-{}-{}.{}",
            self.session.started_at.format("%Y%m%d-%H%M%S"),
            self.session.completion_code,
            format.extension()
        )
    }

    /// Writes the data set into `dir`, creating it if needed, and returns the file path.
    pub fn write_to_dir(&self, dir: &Path, format: OutputFormat) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name(format));
        std::fs::write(&path, self.encode(format)?)?;
        tracing::info!(path = %path.display(), records = self.records.len(), "results written");
        Ok(path)
    }
}
