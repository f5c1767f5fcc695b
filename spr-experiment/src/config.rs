//! Experiment configuration.
//!
//! Every section falls back to the built-in reading study, so an empty file
//! (or no file at all) runs the two-sentence demo experiment.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spr_core::{ButtonScreen, FieldKind, FormField, Key, SurveyForm};

use crate::builder::{DEFAULT_PROMPT, ResponseKeys};
use crate::data::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "spr.toml";
pub const COMPLETION_CODE_PLACEHOLDER: &str = "{completion_code}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub keys: ResponseKeys,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "default_consent")]
    pub consent: ButtonScreen,
    #[serde(default = "default_instructions")]
    pub instructions: ButtonScreen,
    #[serde(default = "default_sentences")]
    pub sentences: Vec<SentenceConfig>,
    #[serde(default = "default_demographics")]
    pub demographics: SurveyForm,
    #[serde(default = "default_completion")]
    pub completion: ButtonScreen,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            keys: ResponseKeys::default(),
            prompt: PromptConfig::default(),
            session: SessionConfig::default(),
            consent: default_consent(),
            instructions: default_instructions(),
            sentences: default_sentences(),
            demographics: default_demographics(),
            completion: default_completion(),
            display: DisplayConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub comprehension: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            comprehension: DEFAULT_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub completion_code_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            completion_code_length: 8,
        }
    }
}

/// One experimental sentence with its comprehension question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceConfig {
    pub text: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Key>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    pub word_size: f32,
    pub text_size: f32,
    pub fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            word_size: 48.0,
            text_size: 24.0,
            fullscreen: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
    /// Print the CSV to stdout when the session finishes.
    pub echo: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./spr-results"),
            format: OutputFormat::Csv,
            echo: true,
        }
    }
}

fn default_consent() -> ButtonScreen {
    ButtonScreen {
        title: "Welcome to the experiment".into(),
        paragraphs: vec![
            "Experiments begin with an information sheet that explains to the participant \
             what they will be doing, how their data will be used, and how they will be \
             remunerated."
                .into(),
            "This is a placeholder for that information, which is normally reviewed as part \
             of the ethical review process."
                .into(),
        ],
        button: "Yes, I consent to participate".into(),
    }
}

fn default_instructions() -> ButtonScreen {
    ButtonScreen {
        title: "Instructions".into(),
        paragraphs: vec![
            "Read the following sentences, one word at a time, pressing SPACE after each \
             word to move on to the next word."
                .into(),
            "After each word-by-word sentence, you will see a yes/no question. For yes/no \
             questions, press y for yes and n for no."
                .into(),
            "Try to read at a natural pace; quickly, but with comprehension.".into(),
        ],
        button: "Continue".into(),
    }
}

fn default_completion() -> ButtonScreen {
    ButtonScreen {
        title: "Finished!".into(),
        paragraphs: vec![
            "Thank you for taking part. Please keep the completion code below so you can \
             claim your payment."
                .into(),
            format!("Your completion code is {COMPLETION_CODE_PLACEHOLDER}"),
        ],
        button: "Click to finish the experiment and see your raw data".into(),
    }
}

fn default_sentences() -> Vec<SentenceConfig> {
    vec![
        SentenceConfig {
            text: "Which events was the reporter describing with great haste?".into(),
            question: "Did the reporter see what happened?".into(),
            expected: None,
        },
        SentenceConfig {
            text: "Which building were the architects featuring in the portfolio?".into(),
            question: "Did the architects have a portfolio?".into(),
            expected: None,
        },
    ]
}

fn default_demographics() -> SurveyForm {
    SurveyForm {
        preamble: "Please answer a few final questions about yourself and our experiment."
            .into(),
        fields: vec![
            FormField {
                name: "english".into(),
                label: "Are you a native speaker of English?".into(),
                kind: FieldKind::Radio {
                    options: vec!["yes".into(), "no".into()],
                },
                required: false,
            },
            FormField {
                name: "age".into(),
                label: "What is your age?".into(),
                kind: FieldKind::Number,
                required: true,
            },
            FormField {
                name: "comments".into(),
                label: "Any other comments?".into(),
                kind: FieldKind::TextArea,
                required: false,
            },
        ],
        button: "Continue".into(),
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ResponseKeys {
            advance,
            accept,
            reject,
        } = self.keys;
        if advance == accept || advance == reject || accept == reject {
            return Err(ConfigError::Invalid(format!(
                "advance ({advance:?}), accept ({accept:?}) and reject ({reject:?}) keys must differ"
            )));
        }

        if self.sentences.is_empty() {
            return Err(ConfigError::Invalid("no sentences configured".into()));
        }
        for (i, s) in self.sentences.iter().enumerate() {
            if let Some(e) = s.expected {
                if e != accept && e != reject {
                    return Err(ConfigError::Invalid(format!(
                        "sentence {i}: expected answer {e:?} is neither the accept nor the reject key"
                    )));
                }
            }
        }

        let mut names = HashSet::new();
        for field in &self.demographics.fields {
            if !names.insert(field.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate demographics field `{}`",
                    field.name
                )));
            }
            if let FieldKind::Radio { options } = &field.kind {
                if options.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "radio field `{}` has no options",
                        field.name
                    )));
                }
            }
        }

        if self.session.completion_code_length == 0 {
            return Err(ConfigError::Invalid(
                "completion_code_length must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Spacing irregularities per sentence, as `(sentence index, finding)`.
    pub fn lint(&self) -> Vec<(usize, SentenceLint)> {
        self.sentences
            .iter()
            .enumerate()
            .flat_map(|(i, s)| lint_sentence(&s.text).into_iter().map(move |l| (i, l)))
            .collect()
    }
}

/// Spacing that makes the literal-space split produce unexpected words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceLint {
    Empty,
    LeadingSpace,
    TrailingSpace,
    DoubleSpace,
    Tab,
}

impl fmt::Display for SentenceLint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SentenceLint::Empty => "sentence is empty and will show a single blank word",
            SentenceLint::LeadingSpace => "leading space produces an empty first word",
            SentenceLint::TrailingSpace => "trailing space produces an empty last word",
            SentenceLint::DoubleSpace => "double space produces an empty word",
            SentenceLint::Tab => "tab is not a word separator and joins its neighbours",
        };
        f.write_str(msg)
    }
}

/// Reports spacing the builder will not normalize. The sentence itself is left untouched.
pub fn lint_sentence(sentence: &str) -> Vec<SentenceLint> {
    if sentence.is_empty() {
        return vec![SentenceLint::Empty];
    }
    let mut out = Vec::new();
    if sentence.starts_with(' ') {
        out.push(SentenceLint::LeadingSpace);
    }
    if sentence.ends_with(' ') {
        out.push(SentenceLint::TrailingSpace);
    }
    if sentence.contains("  ") {
        out.push(SentenceLint::DoubleSpace);
    }
    if sentence.contains('\t') {
        out.push(SentenceLint::Tab);
    }
    out
}

/// Load config from an explicit path, or `spr.toml` in the current directory, or defaults.
pub fn load_config_from(path: Option<&Path>) -> Result<ExperimentConfig, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    match config_path {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading experiment config");
            let content = std::fs::read_to_string(&p).map_err(|source| ConfigError::Io {
                path: p.clone(),
                source,
            })?;
            ExperimentConfig::from_toml_str(&content)
        }
        None => {
            tracing::debug!("no config file found, using the built-in experiment");
            Ok(ExperimentConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_builtin_experiment() {
        let config = ExperimentConfig::from_toml_str("").unwrap();
        assert_eq!(config, ExperimentConfig::default());
        assert_eq!(config.sentences.len(), 2);
        assert_eq!(config.keys.advance, Key::ADVANCE);
        assert_eq!(config.demographics.fields.len(), 3);
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let config = ExperimentConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ExperimentConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            [keys]
            accept = "f"
            reject = "j"

            [[sentences]]
            text = "The cat sat."
            question = "Did the cat sit?"
            expected = "f"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.keys.advance, Key::ADVANCE);
        assert_eq!(config.keys.accept, Key::new('f'));
        assert_eq!(config.sentences.len(), 1);
        assert_eq!(config.sentences[0].expected, Some(Key::new('f')));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.echo);
        assert_eq!(config.consent, default_consent());
    }

    #[test]
    fn demographics_fields_parse_from_tables() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            [demographics]
            preamble = "About you"

            [[demographics.fields]]
            name = "hand"
            label = "Dominant hand"
            type = "radio"
            options = ["left", "right"]
            required = true
            "#,
        )
        .unwrap();
        let field = &config.demographics.fields[0];
        assert!(field.required);
        assert_eq!(
            field.kind,
            FieldKind::Radio {
                options: vec!["left".into(), "right".into()]
            }
        );
        assert_eq!(config.demographics.button, "Continue");
    }

    #[test]
    fn clashing_keys_are_rejected() {
        let err = ExperimentConfig::from_toml_str("[keys]\naccept = \" \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn multi_character_keys_fail_to_parse() {
        let err = ExperimentConfig::from_toml_str("[keys]\naccept = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn expected_answer_must_be_a_response_key() {
        let err = ExperimentConfig::from_toml_str(
            "[[sentences]]\ntext = \"a\"\nquestion = \"b\"\nexpected = \"q\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_sentence_list_is_rejected() {
        let config = ExperimentConfig {
            sentences: vec![],
            ..ExperimentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn lint_flags_spacing_without_changing_anything() {
        assert!(lint_sentence("Which events was the reporter?").is_empty());
        assert_eq!(lint_sentence(""), vec![SentenceLint::Empty]);
        assert_eq!(
            lint_sentence(" a  b\t"),
            vec![
                SentenceLint::LeadingSpace,
                SentenceLint::DoubleSpace,
                SentenceLint::Tab
            ]
        );
        assert_eq!(lint_sentence("a "), vec![SentenceLint::TrailingSpace]);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[session]\ncompletion_code_length = 4\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.session.completion_code_length, 4);
    }
}
