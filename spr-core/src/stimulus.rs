use serde::{Deserialize, Serialize};

use crate::key::Key;

/// One word of a sentence. Its position is its index in the owning sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStimulus {
    pub word: String,
}

impl WordStimulus {
    pub fn new(word: impl Into<String>) -> Self {
        Self { word: word.into() }
    }
}

/// Word-by-word presentation of a sentence; every word advances on the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePresentation {
    pub words: Vec<WordStimulus>,
    pub choices: Vec<Key>,
}

impl SentencePresentation {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words joined back together with single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Yes/no question shown after the sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionCheck {
    pub question: String,
    /// `[accept, reject]`
    pub choices: Vec<Key>,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Key>,
}

impl ComprehensionCheck {
    /// `None` when the check has no expected answer.
    pub fn is_correct(&self, response: Key) -> Option<bool> {
        self.expected.map(|e| e == response)
    }
}
