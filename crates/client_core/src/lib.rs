//! Student roster client: maps remote user records into students and keeps
//! an optimistic in-memory roster in step with the remote collaborator.

pub mod api;
pub mod controller;
pub mod error;
pub mod mapper;
pub mod validation;

pub use api::{HttpStudentsApi, StudentsApi, DEFAULT_API_BASE_URL};
pub use controller::{
    DeleteConfirmation, LoadOutcome, LoadTicket, Notice, NoticeKind, RemoteOutcome,
    RosterController, RosterEvent, RosterState, WriteOutcome, DEFAULT_NOTICE_TTL_MS,
};
pub use error::{
    ApiError, DeleteError, FieldError, LoadError, SubmitError, UpdateError, ValidationError,
    WriteError, WriteOp,
};
pub use validation::StudentForm;
