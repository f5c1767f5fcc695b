use serde::{Deserialize, Serialize};
use spr_core::{ComprehensionCheck, Key, SentencePresentation, TrialSpec, WordStimulus};

pub const DEFAULT_PROMPT: &str = "Answer y or n";

/// Keys that advance a word and answer a comprehension question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseKeys {
    pub advance: Key,
    pub accept: Key,
    pub reject: Key,
}

impl Default for ResponseKeys {
    fn default() -> Self {
        Self {
            advance: Key::ADVANCE,
            accept: Key::ACCEPT,
            reject: Key::REJECT,
        }
    }
}

/// Turns (sentence, question) pairs into self-paced reading trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBuilder {
    pub keys: ResponseKeys,
    pub prompt: String,
}

impl Default for TrialBuilder {
    fn default() -> Self {
        Self {
            keys: ResponseKeys::default(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl TrialBuilder {
    pub fn new(keys: ResponseKeys, prompt: impl Into<String>) -> Self {
        Self {
            keys,
            prompt: prompt.into(),
        }
    }

    /// Splits `sentence` on the literal space character, one word stimulus per token.
    ///
    /// Never fails: `""` gives a single empty word, and doubled spaces give empty words
    /// in between.
    pub fn build(&self, sentence: &str, question: &str) -> TrialSpec {
        let words = sentence.split(' ').map(WordStimulus::new).collect();

        TrialSpec {
            presentation: SentencePresentation {
                words,
                choices: vec![self.keys.advance],
            },
            check: ComprehensionCheck {
                question: question.to_string(),
                choices: vec![self.keys.accept, self.keys.reject],
                prompt: self.prompt.clone(),
                expected: None,
            },
        }
    }
}

/// Builds a trial with the default keys and prompt.
pub fn make_spr_trial(sentence: &str, question: &str) -> TrialSpec {
    TrialBuilder::default().build(sentence, question)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORTER: &str = "Which events was the reporter describing with great haste?";
    const ARCHITECTS: &str = "Which building were the architects featuring in the portfolio?";

    #[test]
    fn reporter_sentence_has_nine_words() {
        let trial = make_spr_trial(REPORTER, "Did the reporter see what happened?");
        let words = &trial.presentation.words;
        assert_eq!(words.len(), 9);
        assert_eq!(words[0].word, "Which");
        assert_eq!(words[8].word, "haste?");
        assert_eq!(trial.check.question, "Did the reporter see what happened?");
    }

    #[test]
    fn architects_sentence_has_one_check() {
        let trial = make_spr_trial(ARCHITECTS, "Did the architects have a portfolio?");
        assert_eq!(trial.presentation.len(), 9);
        assert_eq!(trial.check.choices, vec![Key::ACCEPT, Key::REJECT]);
        assert_eq!(trial.check.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn well_formed_sentences_round_trip() {
        for s in [REPORTER, ARCHITECTS, "one", "a b"] {
            let trial = make_spr_trial(s, "q");
            assert_eq!(trial.presentation.text(), s);
            assert_eq!(trial.presentation.len(), s.split(' ').count());
        }
    }

    #[test]
    fn empty_sentence_gives_one_empty_word() {
        let trial = make_spr_trial("", "q");
        assert_eq!(trial.presentation.words, vec![WordStimulus::new("")]);
    }

    #[test]
    fn irregular_spacing_is_kept_verbatim() {
        let trial = make_spr_trial(" a  b\tc", "q");
        let words: Vec<&str> = trial
            .presentation
            .words
            .iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(words, vec!["", "a", "", "b\tc"]);
    }

    #[test]
    fn question_is_passed_through_unmodified() {
        let q = "  Did   it?\n";
        assert_eq!(make_spr_trial("x", q).check.question, q);
    }

    #[test]
    fn every_word_advances_on_the_single_advance_key() {
        let trial = make_spr_trial(REPORTER, "q");
        assert_eq!(trial.presentation.choices, vec![Key::ADVANCE]);
    }

    #[test]
    fn building_twice_gives_identical_trials() {
        let a = make_spr_trial(REPORTER, "q");
        let b = make_spr_trial(REPORTER, "q");
        assert_eq!(a, b);
    }

    #[test]
    fn custom_keys_flow_into_both_stages() {
        let keys = ResponseKeys {
            advance: Key::new('j'),
            accept: Key::new('f'),
            reject: Key::new('k'),
        };
        let trial = TrialBuilder::new(keys, "Answer f or k").build("a b", "q");
        assert_eq!(trial.presentation.choices, vec![Key::new('j')]);
        assert_eq!(trial.check.choices, vec![Key::new('f'), Key::new('k')]);
        assert_eq!(trial.check.prompt, "Answer f or k");
    }
}
