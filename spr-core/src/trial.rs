use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::stimulus::{ComprehensionCheck, SentencePresentation};

/// Plugin name of every stage in a reading trial.
pub const KEYBOARD_RESPONSE: &str = "html-keyboard-response";

/// A sentence shown word by word, then its comprehension check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub presentation: SentencePresentation,
    pub check: ComprehensionCheck,
}

impl TrialSpec {
    /// Nested runner shape: a word sub-timeline followed by the question.
    pub fn to_runner_json(&self) -> Value {
        let words: Vec<Value> = self
            .presentation
            .words
            .iter()
            .map(|w| json!({ "stimulus": w.word }))
            .collect();

        json!({
            "type": KEYBOARD_RESPONSE,
            "timeline": [
                {
                    "choices": self.presentation.choices,
                    "timeline": words,
                },
                {
                    "stimulus": self.check.question,
                    "choices": self.check.choices,
                    "prompt": self.check.prompt,
                },
            ],
        })
    }
}
