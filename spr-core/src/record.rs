use serde::{Deserialize, Serialize};

use crate::timeline::StageKind;

/// Runner plugin that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialType {
    #[serde(rename = "html-button-response")]
    HtmlButtonResponse,
    #[serde(rename = "html-keyboard-response")]
    HtmlKeyboardResponse,
    #[serde(rename = "survey-html-form")]
    SurveyHtmlForm,
}

impl From<StageKind> for TrialType {
    fn from(kind: StageKind) -> Self {
        match kind {
            StageKind::Button => TrialType::HtmlButtonResponse,
            StageKind::Word | StageKind::Question => TrialType::HtmlKeyboardResponse,
            StageKind::Form => TrialType::SurveyHtmlForm,
        }
    }
}

/// Recorded result per completed stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub trial_index: usize,
    pub trial_type: TrialType,
    pub stage: StageKind,
    pub node_id: String,
    pub stimulus: String,
    /// Key pressed, button index, or JSON-encoded form answers.
    pub response: Option<String>,
    pub rt_ms: Option<f64>,
    pub time_elapsed_ms: f64,
    pub sentence_index: Option<usize>,
    pub word_index: Option<usize>,
    pub correct: Option<bool>,
}
