pub mod form;
pub mod key;
pub mod record;
pub mod screen;
pub mod stimulus;
pub mod timeline;
pub mod trial;

pub use form::{FormEdit, FormError, FormState};
pub use key::Key;
pub use record::{ResponseRecord, TrialType};
pub use screen::{ButtonScreen, FieldKind, FormField, SurveyForm};
pub use stimulus::{ComprehensionCheck, SentencePresentation, WordStimulus};
pub use timeline::{Stage, StageKind, Timeline, TimelineNode};
pub use trial::TrialSpec;
