use rand::Rng;
use spr_core::{ButtonScreen, Timeline, TimelineNode};

use crate::builder::TrialBuilder;
use crate::config::{COMPLETION_CODE_PLACEHOLDER, ExperimentConfig};
use crate::data::SessionInfo;

/// Letters and digits that cannot be confused with each other when copied by hand.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A timeline together with the session it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub timeline: Timeline,
    pub info: SessionInfo,
}

pub fn completion_code<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Consent, instructions, one trial per sentence, demographics, completion.
pub fn build_timeline(config: &ExperimentConfig, completion_code: &str) -> Timeline {
    for (i, lint) in config.lint() {
        tracing::warn!(sentence = i, text = %config.sentences[i].text, "{lint}");
    }

    let builder = TrialBuilder::new(config.keys, config.prompt.comprehension.clone());
    let trials = config.sentences.iter().map(|s| {
        let mut trial = builder.build(&s.text, &s.question);
        trial.check.expected = s.expected;
        TimelineNode::Trial(trial)
    });

    let with_code = |s: &str| s.replace(COMPLETION_CODE_PLACEHOLDER, completion_code);
    let completion = ButtonScreen {
        title: with_code(&config.completion.title),
        paragraphs: config.completion.paragraphs.iter().map(|p| with_code(p)).collect(),
        button: with_code(&config.completion.button),
    };

    std::iter::once(TimelineNode::Button(config.consent.clone()))
        .chain(std::iter::once(TimelineNode::Button(
            config.instructions.clone(),
        )))
        .chain(trials)
        .chain([
            TimelineNode::Form(config.demographics.clone()),
            TimelineNode::Button(completion),
        ])
        .collect()
}

pub fn build_session<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Session {
    let code = completion_code(rng, config.session.completion_code_length);
    let timeline = build_timeline(config, &code);
    tracing::info!(
        trials = timeline.trial_count(),
        stages = timeline.stages().len(),
        "session timeline built"
    );
    Session {
        timeline,
        info: SessionInfo::new(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentenceConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use spr_core::{Key, StageKind};

    #[test]
    fn default_timeline_has_fixed_order() {
        let timeline = build_timeline(&ExperimentConfig::default(), "CODE");
        let nodes = timeline.nodes();
        assert_eq!(nodes.len(), 6);
        assert!(matches!(&nodes[0], TimelineNode::Button(s) if s.title.starts_with("Welcome")));
        assert!(matches!(&nodes[1], TimelineNode::Button(s) if s.title == "Instructions"));
        assert!(matches!(&nodes[2], TimelineNode::Trial(t) if t.presentation.words[0].word == "Which"));
        assert!(matches!(&nodes[3], TimelineNode::Trial(t) if t.check.question.contains("architects")));
        assert!(matches!(&nodes[4], TimelineNode::Form(_)));
        assert!(matches!(&nodes[5], TimelineNode::Button(s) if s.title == "Finished!"));
    }

    #[test]
    fn stage_count_is_screens_plus_words_plus_questions() {
        let timeline = build_timeline(&ExperimentConfig::default(), "CODE");
        let stages = timeline.stages();
        // 2 screens, 9 + 1 and 9 + 1 trial stages, form, completion
        assert_eq!(stages.len(), 2 + 10 + 10 + 1 + 1);
        assert_eq!(stages[11].kind(), StageKind::Question);
        assert_eq!(stages[22].kind(), StageKind::Form);
    }

    #[test]
    fn completion_screen_carries_the_code() {
        let timeline = build_timeline(&ExperimentConfig::default(), "XK7P2QRM");
        let TimelineNode::Button(done) = timeline.nodes().last().unwrap() else {
            panic!("last node should be the completion screen");
        };
        assert!(done.text().contains("XK7P2QRM"));
        assert!(!done.text().contains(COMPLETION_CODE_PLACEHOLDER));
    }

    #[test]
    fn code_is_substituted_in_title_and_button_too() {
        let config = ExperimentConfig {
            completion: ButtonScreen {
                title: "Done: {completion_code}".into(),
                paragraphs: vec![],
                button: "Copy {completion_code}".into(),
            },
            ..ExperimentConfig::default()
        };
        let timeline = build_timeline(&config, "AB12CD34");
        let Some(TimelineNode::Button(done)) = timeline.nodes().last() else {
            panic!("last node should be the completion screen");
        };
        assert_eq!(done.title, "Done: AB12CD34");
        assert_eq!(done.button, "Copy AB12CD34");
    }

    #[test]
    fn expected_answers_reach_the_check() {
        let config = ExperimentConfig {
            sentences: vec![SentenceConfig {
                text: "The dog barked.".into(),
                question: "Did the dog bark?".into(),
                expected: Some(Key::ACCEPT),
            }],
            ..ExperimentConfig::default()
        };
        let timeline = build_timeline(&config, "C");
        let TimelineNode::Trial(trial) = &timeline.nodes()[2] else {
            panic!("third node should be the trial");
        };
        assert_eq!(trial.check.expected, Some(Key::ACCEPT));
        assert_eq!(trial.presentation.len(), 3);
    }

    #[test]
    fn seeded_sessions_share_a_code() {
        let config = ExperimentConfig::default();
        let a = build_session(&config, &mut StdRng::seed_from_u64(42));
        let b = build_session(&config, &mut StdRng::seed_from_u64(42));
        assert_eq!(a.info.completion_code, b.info.completion_code);
        assert_eq!(a.info.completion_code.len(), 8);
        assert!(
            a.info
                .completion_code
                .bytes()
                .all(|c| CODE_ALPHABET.contains(&c))
        );
        assert_eq!(a.timeline, b.timeline);
    }
}
