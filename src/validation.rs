//! Presence validation for notes.
//!
//! A note is persisted only when every required field is present. Failures
//! are collected per field rather than stopping at the first one, so callers
//! can report everything that is missing in one pass.

use serde::Serialize;

use crate::entity::Note;

/// Message attached to a required field that is missing or blank.
pub const BLANK: &str = "can't be blank";

/// Fields of a note that carry validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Message,
    User,
    Project,
}

impl Field {
    /// Capitalized form used in full messages ("Message can't be blank").
    pub fn human_name(&self) -> &'static str {
        match self {
            Field::Message => "Message",
            Field::User => "User",
            Field::Project => "Project",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Message => write!(f, "message"),
            Field::User => write!(f, "user"),
            Field::Project => write!(f, "project"),
        }
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All rule failures for one note, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded against one field.
    pub fn on(&self, field: Field) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Human-readable messages, e.g. `"Message can't be blank"`.
    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{} {}", e.field.human_name(), e.message))
            .collect()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check the presence rules for a note.
pub fn validate(note: &Note) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let message_present = note
        .message
        .as_deref()
        .is_some_and(|m| !m.trim().is_empty());
    if !message_present {
        errors.add(Field::Message, BLANK);
    }
    if note.user.is_none() {
        errors.add(Field::User, BLANK);
    }
    if note.project.is_none() {
        errors.add(Field::Project, BLANK);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
