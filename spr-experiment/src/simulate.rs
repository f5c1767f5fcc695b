//! Headless participant that drives a session with random reading times.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use spr_core::{FieldKind, FormEdit, Stage};
use spr_timing::ManualTimer;

use crate::data::DataSet;
use crate::error::StepError;
use crate::state::{ExperimentEvent, ExperimentStateMachine};
use crate::timeline::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub word_ms: (u64, u64),
    pub question_ms: (u64, u64),
    pub screen_ms: (u64, u64),
    pub age_range: (u32, u32),
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            word_ms: (250, 600),
            question_ms: (800, 2500),
            screen_ms: (1500, 8000),
            age_range: (18, 65),
        }
    }
}

/// Runs every stage of `session` on a manual clock and returns the recorded data.
pub fn simulate_session<R: Rng>(
    session: Session,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<DataSet, StepError> {
    let timer = ManualTimer::new();
    let mut machine = ExperimentStateMachine::from_session(session, timer.clone());

    while let Some(stage) = machine.current_stage().cloned() {
        let range = match stage {
            Stage::Word { .. } => config.word_ms,
            Stage::Question { .. } => config.question_ms,
            Stage::Button { .. } | Stage::Form { .. } => config.screen_ms,
        };
        timer.advance(Duration::from_millis(rng.random_range(range.0..=range.1)));

        match &stage {
            Stage::Word { choices, .. } => {
                let Some(key) = choices.first() else { break };
                machine.handle_event(ExperimentEvent::KeyPressed(*key))?;
            }
            Stage::Question { check, .. } => {
                if check.choices.is_empty() {
                    break;
                }
                let key = check.choices[rng.random_range(0..check.choices.len())];
                machine.handle_event(ExperimentEvent::KeyPressed(key))?;
            }
            Stage::Button { .. } => {
                machine.handle_event(ExperimentEvent::ButtonPressed(0))?;
            }
            Stage::Form { form, .. } => {
                for field in &form.fields {
                    match &field.kind {
                        FieldKind::Radio { .. } => {
                            machine.handle_event(ExperimentEvent::FormEdited(
                                FormEdit::CycleOption(1),
                            ))?;
                        }
                        FieldKind::Number => {
                            let age = rng.random_range(config.age_range.0..=config.age_range.1);
                            for c in age.to_string().chars() {
                                machine
                                    .handle_event(ExperimentEvent::FormEdited(FormEdit::Insert(c)))?;
                            }
                        }
                        FieldKind::TextArea if field.required => {
                            for c in "none".chars() {
                                machine
                                    .handle_event(ExperimentEvent::FormEdited(FormEdit::Insert(c)))?;
                            }
                        }
                        FieldKind::TextArea => {}
                    }
                    machine.handle_event(ExperimentEvent::FormEdited(FormEdit::NextField))?;
                }
                machine.handle_event(ExperimentEvent::FormSubmitted)?;
            }
        }
    }

    Ok(machine.into_data())
}
