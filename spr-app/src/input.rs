use spr_core::{FormEdit, Key, StageKind};
use spr_experiment::ExperimentEvent;
use winit::keyboard::{Key as KeyboardKey, NamedKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Respond(ExperimentEvent),
    Quit,
}

/// Maps a logical key press to what it means on the stage currently showing.
pub fn translate(key: &KeyboardKey, stage: Option<StageKind>, shift: bool) -> Option<Action> {
    if matches!(key, KeyboardKey::Named(NamedKey::Escape)) {
        return Some(Action::Quit);
    }

    let event = match stage? {
        StageKind::Word | StageKind::Question => match key {
            KeyboardKey::Named(NamedKey::Space) => ExperimentEvent::KeyPressed(Key::ADVANCE),
            KeyboardKey::Character(s) => ExperimentEvent::KeyPressed(Key::new(single_char(s)?)),
            _ => return None,
        },
        StageKind::Button => match key {
            KeyboardKey::Named(NamedKey::Enter) => ExperimentEvent::ButtonPressed(0),
            _ => return None,
        },
        StageKind::Form => {
            let edit = match key {
                KeyboardKey::Named(NamedKey::Enter) => {
                    return Some(Action::Respond(ExperimentEvent::FormSubmitted));
                }
                KeyboardKey::Named(NamedKey::Tab) if shift => FormEdit::PrevField,
                KeyboardKey::Named(NamedKey::Tab) => FormEdit::NextField,
                KeyboardKey::Named(NamedKey::ArrowRight) => FormEdit::CycleOption(1),
                KeyboardKey::Named(NamedKey::ArrowLeft) => FormEdit::CycleOption(-1),
                KeyboardKey::Named(NamedKey::Backspace) => FormEdit::Backspace,
                KeyboardKey::Named(NamedKey::Space) => FormEdit::Insert(' '),
                KeyboardKey::Character(s) => FormEdit::Insert(single_char(s)?),
                _ => return None,
            };
            ExperimentEvent::FormEdited(edit)
        }
    };
    Some(Action::Respond(event))
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    fn ch(s: &str) -> KeyboardKey {
        KeyboardKey::Character(SmolStr::new(s))
    }

    fn respond(event: ExperimentEvent) -> Option<Action> {
        Some(Action::Respond(event))
    }

    #[test]
    fn space_advances_words() {
        assert_eq!(
            translate(&KeyboardKey::Named(NamedKey::Space), Some(StageKind::Word), false),
            respond(ExperimentEvent::KeyPressed(Key::ADVANCE))
        );
    }

    #[test]
    fn letters_are_lowercased_on_questions() {
        assert_eq!(
            translate(&ch("Y"), Some(StageKind::Question), false),
            respond(ExperimentEvent::KeyPressed(Key::ACCEPT))
        );
        assert_eq!(translate(&ch("ye"), Some(StageKind::Question), false), None);
    }

    #[test]
    fn enter_presses_the_button() {
        let enter = KeyboardKey::Named(NamedKey::Enter);
        assert_eq!(
            translate(&enter, Some(StageKind::Button), false),
            respond(ExperimentEvent::ButtonPressed(0))
        );
        assert_eq!(translate(&enter, Some(StageKind::Word), false), None);
        assert_eq!(translate(&ch("y"), Some(StageKind::Button), false), None);
    }

    #[test]
    fn form_keys_edit_and_submit() {
        let tab = KeyboardKey::Named(NamedKey::Tab);
        assert_eq!(
            translate(&tab, Some(StageKind::Form), false),
            respond(ExperimentEvent::FormEdited(FormEdit::NextField))
        );
        assert_eq!(
            translate(&tab, Some(StageKind::Form), true),
            respond(ExperimentEvent::FormEdited(FormEdit::PrevField))
        );
        assert_eq!(
            translate(&KeyboardKey::Named(NamedKey::ArrowLeft), Some(StageKind::Form), false),
            respond(ExperimentEvent::FormEdited(FormEdit::CycleOption(-1)))
        );
        assert_eq!(
            translate(&ch("4"), Some(StageKind::Form), false),
            respond(ExperimentEvent::FormEdited(FormEdit::Insert('4')))
        );
        assert_eq!(
            translate(&KeyboardKey::Named(NamedKey::Enter), Some(StageKind::Form), false),
            respond(ExperimentEvent::FormSubmitted)
        );
    }

    #[test]
    fn escape_quits_even_after_the_session() {
        let esc = KeyboardKey::Named(NamedKey::Escape);
        assert_eq!(translate(&esc, Some(StageKind::Word), false), Some(Action::Quit));
        assert_eq!(translate(&esc, None, false), Some(Action::Quit));
        assert_eq!(translate(&ch("y"), None, false), None);
    }
}
