use serde::{Deserialize, Serialize};
use std::fmt;

/// A single accepted response key.
///
/// Keys serialize as one-character strings, so the space bar is `" "`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(char);

impl Key {
    pub const ADVANCE: Key = Key(' ');
    pub const ACCEPT: Key = Key('y');
    pub const REJECT: Key = Key('n');

    pub fn new(c: char) -> Self {
        Key(c.to_ascii_lowercase())
    }

    pub fn as_char(self) -> char {
        self.0
    }

    /// Human-readable label, used in prompts and on screen.
    pub fn label(self) -> String {
        match self.0 {
            ' ' => "SPACE".to_string(),
            c => c.to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Key> for String {
    fn from(k: Key) -> Self {
        k.0.to_string()
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Key::new(c)),
            _ => Err(format!("key must be exactly one character, got {s:?}")),
        }
    }
}
