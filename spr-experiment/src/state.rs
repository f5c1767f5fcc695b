use chrono::Utc;
use spr_core::{FormEdit, FormState, Key, ResponseRecord, Stage, StageKind, SurveyForm, Timeline};
use spr_timing::Timer;

use crate::data::{DataSet, SessionInfo};
use crate::error::StepError;
use crate::timeline::Session;

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    KeyPressed(Key),
    ButtonPressed(usize),
    FormEdited(FormEdit),
    FormSubmitted,
}

/// What an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The stage was completed and the next one is showing.
    Advanced,
    /// The form changed but the stage did not.
    Edited,
    /// The event is not a response this stage accepts.
    Ignored,
    /// The last stage was completed.
    Finished,
}

pub type FinishCallback = Box<dyn FnOnce(&DataSet) + Send>;

/// Steps a participant through the flattened stages of a timeline, one response at a time.
pub struct ExperimentStateMachine<T>
where
    T: Timer<Timestamp = u64>,
{
    pub timer: T,
    stages: Vec<Stage>,
    cursor: usize,
    session_start: u64,
    stage_onset: u64,
    form: Option<FormState>,
    data: DataSet,
    finished: bool,
    on_finish: Option<FinishCallback>,
}

impl<T> ExperimentStateMachine<T>
where
    T: Timer<Timestamp = u64>,
{
    pub fn new(timeline: &Timeline, info: SessionInfo, timer: T) -> Self {
        let now = timer.now();
        let mut machine = Self {
            timer,
            stages: timeline.stages(),
            cursor: 0,
            session_start: now,
            stage_onset: now,
            form: None,
            data: DataSet::new(info),
            finished: false,
            on_finish: None,
        };
        machine.enter_stage();
        if machine.stages.is_empty() {
            machine.finish(true);
        }
        machine
    }

    pub fn from_session(session: Session, timer: T) -> Self {
        Self::new(&session.timeline, session.info, timer)
    }

    /// Called once with the recorded data when the session ends.
    ///
    /// A machine built over an empty timeline is already finished and calls it right away.
    pub fn on_finish(mut self, callback: impl FnOnce(&DataSet) + Send + 'static) -> Self {
        if self.finished {
            callback(&self.data);
        } else {
            self.on_finish = Some(Box::new(callback));
        }
        self
    }

    pub fn handle_event(&mut self, event: ExperimentEvent) -> Result<Transition, StepError> {
        if self.finished {
            return Err(StepError::Finished);
        }
        let Some(stage) = self.stages.get(self.cursor) else {
            return Err(StepError::Finished);
        };

        match (stage, event) {
            (Stage::Word { .. } | Stage::Question { .. }, ExperimentEvent::KeyPressed(key)) => {
                if !stage.accepts(key) {
                    tracing::trace!(key = %key.label(), node = stage.node_id(), "key not accepted");
                    return Ok(Transition::Ignored);
                }
                let correct = match stage {
                    Stage::Question { check, .. } => check.is_correct(key),
                    _ => None,
                };
                self.complete_stage(Some(key.to_string()), correct);
            }
            (Stage::Button { .. }, ExperimentEvent::ButtonPressed(0)) => {
                self.complete_stage(Some("0".to_string()), None);
            }
            (Stage::Form { form, .. }, ExperimentEvent::FormEdited(edit)) => {
                if let Some(state) = self.form.as_mut() {
                    state.apply(form, edit);
                }
                return Ok(Transition::Edited);
            }
            (Stage::Form { form, .. }, ExperimentEvent::FormSubmitted) => {
                let answers = match &self.form {
                    Some(state) => state.submit(form)?,
                    None => FormState::new(form).submit(form)?,
                };
                let response = serde_json::to_string(&answers).unwrap_or_default();
                self.complete_stage(Some(response), None);
            }
            _ => return Ok(Transition::Ignored),
        }

        Ok(if self.finished {
            Transition::Finished
        } else {
            Transition::Advanced
        })
    }

    /// Ends the session early. The callback still runs, with `completed` left false.
    pub fn abort(&mut self) {
        if !self.finished {
            tracing::info!(
                at = self.cursor,
                of = self.stages.len(),
                "session aborted"
            );
            self.finish(false);
        }
    }

    fn complete_stage(&mut self, response: Option<String>, correct: Option<bool>) {
        let stage = &self.stages[self.cursor];
        let now = self.timer.now();
        let to_ms = |ns: u64| ns as f64 / 1_000_000.0;

        let word_index = match stage {
            Stage::Word { index, .. } => Some(*index),
            _ => None,
        };

        let record = ResponseRecord {
            trial_index: self.data.records.len(),
            trial_type: stage.kind().into(),
            stage: stage.kind(),
            node_id: stage.node_id().to_string(),
            stimulus: stage.stimulus(),
            response,
            rt_ms: Some(to_ms(now.saturating_sub(self.stage_onset))),
            time_elapsed_ms: to_ms(now.saturating_sub(self.session_start)),
            sentence_index: stage.trial(),
            word_index,
            correct,
        };
        tracing::debug!(
            node = %record.node_id,
            stage = ?record.stage,
            rt_ms = record.rt_ms.unwrap_or_default(),
            "stage complete"
        );
        self.data.records.push(record);

        self.cursor += 1;
        if self.cursor >= self.stages.len() {
            self.finish(true);
        } else {
            self.stage_onset = now;
            self.enter_stage();
        }
    }

    fn enter_stage(&mut self) {
        self.form = match self.stages.get(self.cursor) {
            Some(Stage::Form { form, .. }) => Some(FormState::new(form)),
            _ => None,
        };
    }

    fn finish(&mut self, completed: bool) {
        self.finished = true;
        self.form = None;
        self.data.session.completed = completed;
        self.data.session.finished_at = Some(Utc::now());
        if completed {
            tracing::info!(records = self.data.records.len(), "session finished");
        }
        if let Some(callback) = self.on_finish.take() {
            callback(&self.data);
        }
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        if self.finished {
            None
        } else {
            self.stages.get(self.cursor)
        }
    }

    pub fn current_kind(&self) -> Option<StageKind> {
        self.current_stage().map(Stage::kind)
    }

    /// The form on screen together with its in-progress answers.
    pub fn current_form(&self) -> Option<(&SurveyForm, &FormState)> {
        match (self.current_stage(), &self.form) {
            (Some(Stage::Form { form, .. }), Some(state)) => Some((form, state)),
            _ => None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn data(&self) -> &DataSet {
        &self.data
    }

    pub fn into_data(self) -> DataSet {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::make_spr_trial;
    use crate::config::ExperimentConfig;
    use crate::timeline::build_timeline;
    use spr_core::{ButtonScreen, TimelineNode, TrialType};
    use spr_timing::ManualTimer;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn machine() -> ExperimentStateMachine<ManualTimer> {
        let timeline = build_timeline(&ExperimentConfig::default(), "TESTCODE");
        ExperimentStateMachine::new(&timeline, SessionInfo::new("TESTCODE"), ManualTimer::new())
    }

    fn press(m: &mut ExperimentStateMachine<ManualTimer>, c: char) -> Transition {
        m.handle_event(ExperimentEvent::KeyPressed(Key::new(c))).unwrap()
    }

    fn fill_form(m: &mut ExperimentStateMachine<ManualTimer>) {
        m.handle_event(ExperimentEvent::FormEdited(FormEdit::NextField))
            .unwrap();
        for c in "29".chars() {
            m.handle_event(ExperimentEvent::FormEdited(FormEdit::Insert(c)))
                .unwrap();
        }
    }

    #[test]
    fn steps_through_the_default_session_in_order() {
        let mut m = machine();
        assert_eq!(m.stage_count(), 24);
        assert_eq!(m.current_kind(), Some(StageKind::Button));

        assert_eq!(
            m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap(),
            Transition::Advanced
        );
        m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap();

        for trial in 0..2 {
            for _ in 0..9 {
                assert_eq!(m.current_kind(), Some(StageKind::Word));
                assert_eq!(m.current_stage().and_then(Stage::trial), Some(trial));
                assert_eq!(press(&mut m, ' '), Transition::Advanced);
            }
            assert_eq!(m.current_kind(), Some(StageKind::Question));
            press(&mut m, 'y');
        }

        assert_eq!(m.current_kind(), Some(StageKind::Form));
        fill_form(&mut m);
        m.handle_event(ExperimentEvent::FormSubmitted).unwrap();

        assert_eq!(m.current_kind(), Some(StageKind::Button));
        assert_eq!(
            m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap(),
            Transition::Finished
        );
        assert!(m.is_finished());
        assert!(m.current_stage().is_none());

        let data = m.into_data();
        assert_eq!(data.records.len(), 24);
        assert!(data.session.completed);
        let words: Vec<&str> = data
            .of_kind(StageKind::Word)
            .take(9)
            .map(|r| r.stimulus.as_str())
            .collect();
        assert_eq!(words.first(), Some(&"Which"));
        assert_eq!(words.last(), Some(&"haste?"));
        assert!(data.records.iter().enumerate().all(|(i, r)| r.trial_index == i));
    }

    #[test]
    fn keys_outside_the_stage_choices_are_ignored() {
        let mut m = machine();
        m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap();
        assert_eq!(press(&mut m, ' '), Transition::Ignored);
        m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap();

        let before = m.cursor();
        assert_eq!(press(&mut m, 'y'), Transition::Ignored);
        assert_eq!(press(&mut m, 'x'), Transition::Ignored);
        assert_eq!(
            m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap(),
            Transition::Ignored
        );
        assert_eq!(m.cursor(), before);
        assert_eq!(m.data().records.len(), 2);

        for _ in 0..9 {
            press(&mut m, ' ');
        }
        assert_eq!(press(&mut m, ' '), Transition::Ignored);
        assert_eq!(m.current_kind(), Some(StageKind::Question));
    }

    #[test]
    fn reaction_times_come_from_the_injected_timer() {
        let timer = ManualTimer::new();
        let timeline = Timeline::new(vec![TimelineNode::Trial(make_spr_trial("a b", "q?"))]);
        let mut m = ExperimentStateMachine::new(&timeline, SessionInfo::new("C"), timer.clone());

        timer.advance(Duration::from_millis(320));
        press(&mut m, ' ');
        timer.advance(Duration::from_millis(275));
        press(&mut m, ' ');
        timer.advance(Duration::from_millis(1200));
        assert_eq!(press(&mut m, 'n'), Transition::Finished);

        let data = m.into_data();
        let rts: Vec<f64> = data.records.iter().filter_map(|r| r.rt_ms).collect();
        assert_eq!(rts, vec![320.0, 275.0, 1200.0]);
        assert_eq!(data.records[2].time_elapsed_ms, 1795.0);
        assert_eq!(data.records[2].response.as_deref(), Some("n"));
        assert_eq!(data.records[1].word_index, Some(1));
        assert_eq!(data.records[2].trial_type, TrialType::HtmlKeyboardResponse);
        assert_eq!(data.reading_times(0), vec![320.0, 275.0]);
    }

    #[test]
    fn expected_answers_are_scored() {
        let mut trial = make_spr_trial("a", "q?");
        trial.check.expected = Some(Key::ACCEPT);
        let timeline = Timeline::new(vec![TimelineNode::Trial(trial)]);
        let mut m = ExperimentStateMachine::new(&timeline, SessionInfo::new("C"), ManualTimer::new());
        press(&mut m, ' ');
        press(&mut m, 'n');
        assert_eq!(m.data().records[1].correct, Some(false));
        assert_eq!(m.data().records[0].correct, None);
    }

    #[test]
    fn required_fields_hold_the_form() {
        let mut m = machine();
        while m.current_kind() != Some(StageKind::Form) {
            match m.current_kind() {
                Some(StageKind::Button) => {
                    m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap();
                }
                Some(StageKind::Word) => {
                    press(&mut m, ' ');
                }
                _ => {
                    press(&mut m, 'y');
                }
            }
        }

        let err = m.handle_event(ExperimentEvent::FormSubmitted).unwrap_err();
        assert!(matches!(err, StepError::Form(_)));
        assert_eq!(m.current_kind(), Some(StageKind::Form));

        fill_form(&mut m);
        let (_, state) = m.current_form().unwrap();
        assert_eq!(state.value(1), Some("29"));
        m.handle_event(ExperimentEvent::FormSubmitted).unwrap();

        let record = m.data().records.last().unwrap();
        assert_eq!(record.trial_type, TrialType::SurveyHtmlForm);
        let answers: serde_json::Value =
            serde_json::from_str(record.response.as_deref().unwrap()).unwrap();
        assert_eq!(answers["age"], "29");
    }

    #[test]
    fn finish_callback_runs_exactly_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let timeline = Timeline::new(vec![TimelineNode::Button(ButtonScreen {
            title: "Done".into(),
            paragraphs: vec![],
            button: "OK".into(),
        })]);
        let mut m = ExperimentStateMachine::new(&timeline, SessionInfo::new("C"), ManualTimer::new())
            .on_finish(move |data| sink.lock().unwrap().push(data.records.len()));

        assert_eq!(
            m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap(),
            Transition::Finished
        );
        assert!(matches!(
            m.handle_event(ExperimentEvent::ButtonPressed(0)),
            Err(StepError::Finished)
        ));
        m.abort();
        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }

    #[test]
    fn empty_timeline_still_reports_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let mut m = ExperimentStateMachine::new(
            &Timeline::new(vec![]),
            SessionInfo::new("C"),
            ManualTimer::new(),
        )
        .on_finish(move |data| sink.lock().unwrap().push(data.session.completed));

        assert!(m.is_finished());
        m.abort();
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }

    #[test]
    fn abort_hands_over_partial_data() {
        let calls = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&calls);
        let mut m = machine().on_finish(move |data| {
            *sink.lock().unwrap() = Some((data.records.len(), data.session.completed));
        });
        m.handle_event(ExperimentEvent::ButtonPressed(0)).unwrap();
        m.abort();
        assert!(m.is_finished());
        assert_eq!(*calls.lock().unwrap(), Some((1, false)));
    }
}
