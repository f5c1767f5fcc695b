use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const BUTTON_RESPONSE: &str = "html-button-response";
pub const SURVEY_FORM: &str = "survey-html-form";

/// Static text screen with a single button (consent, instructions, completion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonScreen {
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    pub button: String,
}

impl ButtonScreen {
    /// Title and paragraphs as one block; this is what gets recorded as the stimulus.
    pub fn text(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.paragraphs.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_runner_json(&self) -> Value {
        json!({
            "type": BUTTON_RESPONSE,
            "stimulus": self.text(),
            "choices": [self.button],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Radio { options: Vec<String> },
    Number,
    TextArea,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// Multi-field questionnaire submitted as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyForm {
    pub preamble: String,
    pub fields: Vec<FormField>,
    #[serde(default = "default_submit")]
    pub button: String,
}

fn default_submit() -> String {
    "Continue".to_string()
}

impl SurveyForm {
    pub fn to_runner_json(&self) -> Value {
        json!({
            "type": SURVEY_FORM,
            "preamble": self.preamble,
            "fields": self.fields,
            "button_label": self.button,
        })
    }
}
