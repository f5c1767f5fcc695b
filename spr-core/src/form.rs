use std::collections::BTreeMap;

use thiserror::Error;

use crate::screen::{FieldKind, SurveyForm};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("field `{field}` is required")]
    MissingRequired { field: String },

    #[error("field `{field}` expects a number, got {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("unknown form field `{0}`")]
    UnknownField(String),
}

/// Editing operations a participant can perform on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEdit {
    Insert(char),
    Backspace,
    NextField,
    PrevField,
    /// Move the radio selection of the focused field by `n` options.
    CycleOption(i32),
}

/// In-progress answers to a [`SurveyForm`], one value per field.
///
/// Radio fields hold the selected option text, or an empty string while unselected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    values: Vec<String>,
    focus: usize,
}

impl FormState {
    pub fn new(form: &SurveyForm) -> Self {
        Self {
            values: vec![String::new(); form.fields.len()],
            focus: 0,
        }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn set(&mut self, form: &SurveyForm, name: &str, value: &str) -> Result<(), FormError> {
        let index = form
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        self.values[index] = value.to_string();
        Ok(())
    }

    pub fn apply(&mut self, form: &SurveyForm, edit: FormEdit) {
        let n = form.fields.len();
        if n == 0 {
            return;
        }
        match edit {
            FormEdit::NextField => self.focus = (self.focus + 1) % n,
            FormEdit::PrevField => self.focus = (self.focus + n - 1) % n,
            FormEdit::Backspace => {
                if !matches!(form.fields[self.focus].kind, FieldKind::Radio { .. }) {
                    self.values[self.focus].pop();
                }
            }
            FormEdit::Insert(c) => match &form.fields[self.focus].kind {
                FieldKind::Radio { options } => {
                    let lower = c.to_lowercase().to_string();
                    if let Some(opt) = options.iter().find(|o| o.to_lowercase().starts_with(&lower)) {
                        self.values[self.focus] = opt.clone();
                    }
                }
                FieldKind::Number => {
                    if c.is_ascii_digit() || c == '.' || c == '-' {
                        self.values[self.focus].push(c);
                    }
                }
                FieldKind::TextArea => {
                    if !c.is_control() {
                        self.values[self.focus].push(c);
                    }
                }
            },
            FormEdit::CycleOption(step) => {
                if let FieldKind::Radio { options } = &form.fields[self.focus].kind {
                    if options.is_empty() {
                        return;
                    }
                    let len = options.len() as i32;
                    let current = options
                        .iter()
                        .position(|o| *o == self.values[self.focus])
                        .map(|i| i as i32)
                        // unselected: stepping forward lands on the first option
                        .unwrap_or(if step > 0 { -1 } else { 0 });
                    let next = (current + step).rem_euclid(len) as usize;
                    self.values[self.focus] = options[next].clone();
                }
            }
        }
    }

    /// Validates the answers and returns them keyed by field name.
    ///
    /// Unselected radio fields are left out of the result; text fields are always present.
    pub fn submit(&self, form: &SurveyForm) -> Result<BTreeMap<String, String>, FormError> {
        let mut answers = BTreeMap::new();
        for (field, value) in form.fields.iter().zip(&self.values) {
            let trimmed = value.trim();
            if field.required && trimmed.is_empty() {
                return Err(FormError::MissingRequired {
                    field: field.name.clone(),
                });
            }
            match field.kind {
                FieldKind::Radio { .. } if trimmed.is_empty() => continue,
                FieldKind::Number if !trimmed.is_empty() && trimmed.parse::<f64>().is_err() => {
                    return Err(FormError::InvalidNumber {
                        field: field.name.clone(),
                        value: value.clone(),
                    });
                }
                _ => {}
            }
            answers.insert(field.name.clone(), value.clone());
        }
        Ok(answers)
    }
}
