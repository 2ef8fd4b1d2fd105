use std::fmt;

use shared::domain::StudentId;
use thiserror::Error;
use uuid::Uuid;

/// Failure talking to the remote users collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{status} {reason}")]
    Status { status: u16, reason: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            },
            None => Self::Transport(value),
        }
    }
}

/// Remote read failed; the previously loaded collection is kept.
#[derive(Debug, Error)]
#[error("Unable to load students. {0}")]
pub struct LoadError(#[from] pub ApiError);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Remote write failed; the optimistic local change is kept.
#[derive(Debug, Error)]
#[error("Unable to {op} student. {source}")]
pub struct WriteError {
    pub op: WriteOp,
    #[source]
    pub source: ApiError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    TooShort { min: usize },
    InvalidCharacters,
}

/// Form input rejected before any remote call was attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    pub name: Option<FieldError>,
    pub course: Option<FieldError>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.course.is_none()
    }

    pub fn name_message(&self) -> Option<&'static str> {
        self.name.map(|err| match err {
            FieldError::Required => "Name is required",
            FieldError::TooShort { .. } => "Name must be at least 2 characters",
            FieldError::InvalidCharacters => {
                "Name should contain only letters, spaces, hyphens, and apostrophes"
            }
        })
    }

    pub fn course_message(&self) -> Option<&'static str> {
        self.course.map(|err| match err {
            FieldError::Required => "Course is required",
            FieldError::TooShort { .. } => "Course must be at least 2 characters",
            FieldError::InvalidCharacters => "Course contains invalid characters",
        })
    }

    fn summary(&self) -> String {
        [self.name_message(), self.course_message()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("no student with id {0}")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("no student with id {0}")]
    UnknownStudent(StudentId),
    #[error("no pending delete confirmation {0}")]
    UnknownConfirmation(Uuid),
}

/// Error surfaced by [`crate::controller::RosterController::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Update(#[from] UpdateError),
}
