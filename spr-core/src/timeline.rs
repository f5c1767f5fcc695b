use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::Key;
use crate::screen::{ButtonScreen, SurveyForm};
use crate::stimulus::ComprehensionCheck;
use crate::trial::TrialSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TimelineNode {
    Button(ButtonScreen),
    Trial(TrialSpec),
    Form(SurveyForm),
}

impl TimelineNode {
    pub fn to_runner_json(&self) -> Value {
        match self {
            TimelineNode::Button(s) => s.to_runner_json(),
            TimelineNode::Trial(t) => t.to_runner_json(),
            TimelineNode::Form(f) => f.to_runner_json(),
        }
    }
}

/// Ordered screens and trials of one session. The order never changes once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    nodes: Vec<TimelineNode>,
}

impl Timeline {
    pub fn new(nodes: Vec<TimelineNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TimelineNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn trial_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TimelineNode::Trial(_)))
            .count()
    }

    pub fn to_runner_json(&self) -> Value {
        Value::Array(self.nodes.iter().map(TimelineNode::to_runner_json).collect())
    }

    /// Flattens nested trials into the sequence of stages a participant steps through.
    ///
    /// A trial with `k` words becomes `k` word stages followed by one question stage.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = Vec::new();
        let mut trial = 0;
        for (node_index, node) in self.nodes.iter().enumerate() {
            match node {
                TimelineNode::Button(screen) => stages.push(Stage::Button {
                    node_id: node_index.to_string(),
                    screen: screen.clone(),
                }),
                TimelineNode::Form(form) => stages.push(Stage::Form {
                    node_id: node_index.to_string(),
                    form: form.clone(),
                }),
                TimelineNode::Trial(spec) => {
                    for (index, w) in spec.presentation.words.iter().enumerate() {
                        stages.push(Stage::Word {
                            node_id: format!("{node_index}.0.{index}"),
                            trial,
                            index,
                            word: w.word.clone(),
                            choices: spec.presentation.choices.clone(),
                        });
                    }
                    stages.push(Stage::Question {
                        node_id: format!("{node_index}.1"),
                        trial,
                        check: spec.check.clone(),
                    });
                    trial += 1;
                }
            }
        }
        stages
    }
}

impl FromIterator<TimelineNode> for Timeline {
    fn from_iter<I: IntoIterator<Item = TimelineNode>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Button,
    Word,
    Question,
    Form,
}

/// One step of a session, as presented by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Button {
        node_id: String,
        screen: ButtonScreen,
    },
    Word {
        node_id: String,
        trial: usize,
        index: usize,
        word: String,
        choices: Vec<Key>,
    },
    Question {
        node_id: String,
        trial: usize,
        check: ComprehensionCheck,
    },
    Form {
        node_id: String,
        form: SurveyForm,
    },
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Button { .. } => StageKind::Button,
            Stage::Word { .. } => StageKind::Word,
            Stage::Question { .. } => StageKind::Question,
            Stage::Form { .. } => StageKind::Form,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Stage::Button { node_id, .. }
            | Stage::Word { node_id, .. }
            | Stage::Question { node_id, .. }
            | Stage::Form { node_id, .. } => node_id,
        }
    }

    /// Keys accepted on this stage. Button and form stages take no keyboard responses.
    pub fn choices(&self) -> &[Key] {
        match self {
            Stage::Word { choices, .. } => choices,
            Stage::Question { check, .. } => &check.choices,
            _ => &[],
        }
    }

    pub fn accepts(&self, key: Key) -> bool {
        self.choices().contains(&key)
    }

    pub fn trial(&self) -> Option<usize> {
        match self {
            Stage::Word { trial, .. } | Stage::Question { trial, .. } => Some(*trial),
            _ => None,
        }
    }

    /// Text recorded alongside the response.
    pub fn stimulus(&self) -> String {
        match self {
            Stage::Button { screen, .. } => screen.text(),
            Stage::Word { word, .. } => word.clone(),
            Stage::Question { check, .. } => check.question.clone(),
            Stage::Form { form, .. } => form.preamble.clone(),
        }
    }
}
