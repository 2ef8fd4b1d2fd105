//! Form input rules applied before anything reaches the controller's remote
//! calls.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared::domain::StudentChanges;

use crate::error::{FieldError, ValidationError};

pub const MIN_FIELD_LEN: usize = 2;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-']+$").expect("valid name regex"));

/// Raw values as typed into the add/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentForm {
    pub name: String,
    pub course: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl StudentForm {
    pub fn new(name: impl Into<String>, course: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            course: course.into(),
            email: None,
            phone: None,
        }
    }

    /// Trims every field and checks the name/course rules.
    pub fn validate(&self) -> Result<ValidForm, ValidationError> {
        let errors = ValidationError {
            name: validate_name(&self.name),
            course: validate_course(&self.course),
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidForm {
            name: self.name.trim().to_string(),
            course: self.course.trim().to_string(),
            email: trimmed_non_empty(self.email.as_deref()),
            phone: trimmed_non_empty(self.phone.as_deref()),
        })
    }
}

/// Form input that passed validation; all values trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm {
    pub name: String,
    pub course: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ValidForm {
    pub fn into_changes(self) -> StudentChanges {
        StudentChanges {
            name: Some(self.name),
            course: Some(self.course),
            email: self.email,
            phone: self.phone,
            ..StudentChanges::default()
        }
    }
}

pub fn validate_name(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::Required);
    }
    if trimmed.chars().count() < MIN_FIELD_LEN {
        return Some(FieldError::TooShort { min: MIN_FIELD_LEN });
    }
    if !NAME_RE.is_match(trimmed) {
        return Some(FieldError::InvalidCharacters);
    }
    None
}

pub fn validate_course(value: &str) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(FieldError::Required);
    }
    if trimmed.chars().count() < MIN_FIELD_LEN {
        return Some(FieldError::TooShort { min: MIN_FIELD_LEN });
    }
    None
}

/// Checks the name/course values carried by a partial update. Absent fields
/// are not validated.
pub fn validate_changes(changes: &StudentChanges) -> Result<StudentChanges, ValidationError> {
    let errors = ValidationError {
        name: changes.name.as_deref().and_then(validate_name),
        course: changes.course.as_deref().and_then(validate_course),
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut cleaned = changes.clone();
    cleaned.name = changes.name.as_deref().map(|v| v.trim().to_string());
    cleaned.course = changes.course.as_deref().map(|v| v.trim().to_string());
    Ok(cleaned)
}

fn trimmed_non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
