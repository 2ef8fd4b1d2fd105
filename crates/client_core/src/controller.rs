//! In-memory student roster kept in step with the remote users collaborator.
//!
//! Every write is applied locally first and then attempted remotely. A failed
//! remote write never reverts local state: the local collection is
//! authoritative for the session and the remote outcome is reported next to
//! it in a [`WriteOutcome`]. Loads are the only operation that replaces the
//! collection wholesale, and only the most recently issued load may do so.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::{Student, StudentChanges, StudentId, FIRST_LOCAL_ID},
    protocol::ExternalUser,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    api::StudentsApi,
    error::{
        ApiError, DeleteError, LoadError, SubmitError, UpdateError, ValidationError, WriteError,
        WriteOp,
    },
    mapper,
    validation::{validate_changes, StudentForm},
};

pub const DEFAULT_NOTICE_TTL_MS: u64 = 3_000;
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
}

/// Transient message shown after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.raised_at >= ttl
    }
}

/// Everything a presentation layer needs to render the roster.
#[derive(Debug, Clone, Default)]
pub struct RosterState {
    pub students: Vec<Student>,
    pub is_loading: bool,
    /// Set once any load has succeeded.
    pub loaded: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,
    pub submitting: bool,
    pub deleting: Option<StudentId>,
    pub editing: Option<StudentId>,
}

impl RosterState {
    /// Next local id: one past the largest id held, or [`FIRST_LOCAL_ID`]
    /// when nothing is held. If the largest id is `i64::MAX`, falls back to
    /// the smallest unused id from [`FIRST_LOCAL_ID`] upwards.
    pub fn generate_id(&self) -> StudentId {
        let Some(max) = self.students.iter().map(|student| student.id).max() else {
            return StudentId(FIRST_LOCAL_ID);
        };
        match max.0.checked_add(1) {
            Some(next) => StudentId(next),
            None => self.first_unused_id(),
        }
    }

    fn first_unused_id(&self) -> StudentId {
        let taken: HashSet<StudentId> = self.students.iter().map(|student| student.id).collect();
        (FIRST_LOCAL_ID..=i64::MAX)
            .map(StudentId)
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or(StudentId(FIRST_LOCAL_ID))
    }

    pub fn find(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }

    fn position(&self, id: StudentId) -> Option<usize> {
        self.students.iter().position(|student| student.id == id)
    }

    /// True when there is a collection to show, even an empty one.
    pub fn has_data(&self) -> bool {
        self.loaded || !self.students.is_empty()
    }

    /// Nothing to show and the last load failed.
    pub fn needs_retry(&self) -> bool {
        !self.is_loading && self.error.is_some() && self.students.is_empty()
    }

    pub fn editing_student(&self) -> Option<&Student> {
        self.editing.and_then(|id| self.find(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    Loaded { count: usize },
    LoadFailed { message: String },
    LoadDiscarded { ticket: u64 },
    Added(Student),
    Updated(Student),
    Removed(StudentId),
    SubmittingChanged(bool),
    DeletingChanged(Option<StudentId>),
    WriteFailed { op: WriteOp, message: String },
}

#[derive(Debug)]
pub enum RemoteOutcome {
    Synced,
    Failed(WriteError),
}

impl RemoteOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }

    pub fn error(&self) -> Option<&WriteError> {
        match self {
            Self::Synced => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// Local result of a write plus what happened when it was sent remotely.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    pub local: T,
    pub remote: RemoteOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { count: usize },
    /// A newer load was issued before this one settled.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub token: Uuid,
    pub student_id: StudentId,
    pub prompt: String,
}

pub struct RosterController {
    api: Arc<dyn StudentsApi>,
    state: RosterState,
    notice_ttl: Duration,
    issued_loads: u64,
    pending_deletes: HashMap<Uuid, StudentId>,
    events: broadcast::Sender<RosterEvent>,
}

impl RosterController {
    pub fn new(api: Arc<dyn StudentsApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            state: RosterState::default(),
            notice_ttl: notice_ttl_from_ms(DEFAULT_NOTICE_TTL_MS),
            issued_loads: 0,
            pending_deletes: HashMap::new(),
            events,
        }
    }

    pub fn with_notice_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.notice_ttl = notice_ttl_from_ms(ttl_ms);
        self
    }

    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn students(&self) -> &[Student] {
        &self.state.students
    }

    pub fn api(&self) -> Arc<dyn StudentsApi> {
        Arc::clone(&self.api)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    /// Current notice, or `None` once it has outlived the configured TTL.
    pub fn visible_notice(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.state
            .notice
            .as_ref()
            .filter(|notice| !notice.is_expired(now, self.notice_ttl))
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    pub fn clear_notice(&mut self) {
        self.state.notice = None;
    }

    pub async fn load(&mut self) -> Result<LoadOutcome, LoadError> {
        let ticket = self.begin_load();
        let result = self.api.list_users().await;
        self.finish_load(ticket, result)
    }

    /// Marks a load as in flight. Only the latest ticket's result is applied.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_loads += 1;
        self.state.is_loading = true;
        self.state.error = None;
        LoadTicket(self.issued_loads)
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ExternalUser>, ApiError>,
    ) -> Result<LoadOutcome, LoadError> {
        if ticket.0 != self.issued_loads {
            debug!(
                ticket = ticket.0,
                latest = self.issued_loads,
                "roster: discarding stale load result"
            );
            self.emit(RosterEvent::LoadDiscarded { ticket: ticket.0 });
            return Ok(LoadOutcome::Stale);
        }

        self.state.is_loading = false;
        match result {
            Ok(users) => {
                self.state.students = mapper::students_from_users(&users);
                self.state.loaded = true;
                let count = self.state.students.len();
                info!(count, "roster: loaded students");
                self.emit(RosterEvent::Loaded { count });
                Ok(LoadOutcome::Applied { count })
            }
            Err(source) => {
                let err = LoadError(source);
                error!("roster: load failed: {err}");
                self.state.error = Some(err.to_string());
                self.emit(RosterEvent::LoadFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Opens a student for editing. Returns `None` for an unknown id.
    pub fn begin_edit(&mut self, id: StudentId) -> Option<&Student> {
        self.state.position(id)?;
        self.state.editing = Some(id);
        self.state.error = None;
        self.state.notice = None;
        self.state.find(id)
    }

    pub fn begin_add(&mut self) {
        self.state.editing = None;
        self.state.error = None;
        self.state.notice = None;
    }

    pub fn cancel_edit(&mut self) {
        self.state.editing = None;
        self.state.error = None;
    }

    /// Routes form input to update when an edit is open, create otherwise.
    pub async fn submit(
        &mut self,
        form: &StudentForm,
    ) -> Result<WriteOutcome<Student>, SubmitError> {
        match self.state.editing {
            Some(id) => {
                let changes = form.validate()?.into_changes();
                Ok(self.update(id, &changes).await?)
            }
            None => Ok(self.create(form).await?),
        }
    }

    pub async fn create(
        &mut self,
        form: &StudentForm,
    ) -> Result<WriteOutcome<Student>, ValidationError> {
        self.set_submitting(true);
        let result = self.create_inner(form).await;
        self.set_submitting(false);
        result
    }

    async fn create_inner(
        &mut self,
        form: &StudentForm,
    ) -> Result<WriteOutcome<Student>, ValidationError> {
        let valid = form.validate()?;
        self.state.error = None;

        let student = Student {
            id: self.state.generate_id(),
            name: valid.name,
            course: valid.course,
            year: 1,
            email: valid.email.unwrap_or_default(),
            phone: valid.phone.unwrap_or_default(),
            address: None,
        };
        self.state.students.push(student.clone());
        self.state.editing = None;
        self.emit(RosterEvent::Added(student.clone()));

        let payload = mapper::create_payload(&student.name, &student.course, Some(&student.email));
        let remote = match self.api.create_user(&payload).await {
            Ok(echo) => {
                info!(
                    student_id = student.id.0,
                    remote_id = echo.id,
                    "roster: created student"
                );
                RemoteOutcome::Synced
            }
            Err(source) => self.write_failed(WriteOp::Create, source),
        };

        self.raise_notice(&remote, format!("Student \"{}\" added", student.name));
        Ok(WriteOutcome {
            local: student,
            remote,
        })
    }

    pub async fn update(
        &mut self,
        id: StudentId,
        changes: &StudentChanges,
    ) -> Result<WriteOutcome<Student>, UpdateError> {
        self.set_submitting(true);
        let result = self.update_inner(id, changes).await;
        self.set_submitting(false);
        result
    }

    async fn update_inner(
        &mut self,
        id: StudentId,
        changes: &StudentChanges,
    ) -> Result<WriteOutcome<Student>, UpdateError> {
        let changes = validate_changes(changes)?;
        let Some(index) = self.state.position(id) else {
            warn!(student_id = id.0, "roster: update for unknown student");
            return Err(UpdateError::UnknownStudent(id));
        };
        self.state.error = None;

        let student = &mut self.state.students[index];
        student.apply(&changes);
        let updated = student.clone();
        self.emit(RosterEvent::Updated(updated.clone()));

        let payload = mapper::update_payload(&updated);
        let remote = match self.api.update_user(id, &payload).await {
            Ok(_) => {
                info!(student_id = id.0, "roster: updated student");
                RemoteOutcome::Synced
            }
            Err(source) => self.write_failed(WriteOp::Update, source),
        };

        self.state.editing = None;
        self.raise_notice(&remote, format!("Student \"{}\" updated", updated.name));
        Ok(WriteOutcome {
            local: updated,
            remote,
        })
    }

    /// First phase of a delete. Nothing changes until the returned token is
    /// passed to [`Self::confirm_delete`].
    pub fn request_delete(&mut self, id: StudentId) -> Result<DeleteConfirmation, DeleteError> {
        let name = self
            .state
            .find(id)
            .map(|student| student.name.clone())
            .ok_or(DeleteError::UnknownStudent(id))?;
        let display_name = if name.is_empty() {
            "this student".to_string()
        } else {
            name
        };

        // At most one pending confirmation per student.
        self.pending_deletes.retain(|_, pending| *pending != id);
        let token = Uuid::new_v4();
        self.pending_deletes.insert(token, id);
        debug!(student_id = id.0, %token, "roster: delete awaiting confirmation");
        Ok(DeleteConfirmation {
            token,
            student_id: id,
            prompt: format!(
                "Are you sure you want to delete {display_name}? This action cannot be undone."
            ),
        })
    }

    /// Drops a pending delete. Returns whether the token was known.
    pub fn cancel_delete(&mut self, token: Uuid) -> bool {
        self.pending_deletes.remove(&token).is_some()
    }

    pub async fn confirm_delete(
        &mut self,
        token: Uuid,
    ) -> Result<WriteOutcome<Student>, DeleteError> {
        let id = self
            .pending_deletes
            .remove(&token)
            .ok_or(DeleteError::UnknownConfirmation(token))?;
        // The student may have vanished in a reload since the request.
        let index = self
            .state
            .position(id)
            .ok_or(DeleteError::UnknownStudent(id))?;

        self.set_deleting(Some(id));
        self.state.error = None;
        let removed = self.state.students.remove(index);
        if self.state.editing == Some(id) {
            self.state.editing = None;
        }
        self.emit(RosterEvent::Removed(id));

        let remote = match self.api.delete_user(id).await {
            Ok(()) => {
                info!(student_id = id.0, "roster: deleted student");
                RemoteOutcome::Synced
            }
            Err(source) => self.write_failed(WriteOp::Delete, source),
        };
        self.set_deleting(None);

        self.raise_notice(&remote, format!("Student \"{}\" deleted", removed.name));
        Ok(WriteOutcome {
            local: removed,
            remote,
        })
    }

    /// Both delete phases with a synchronous yes/no gate. `Ok(None)` when
    /// the gate declines.
    pub async fn delete_with<F>(
        &mut self,
        id: StudentId,
        confirm: F,
    ) -> Result<Option<WriteOutcome<Student>>, DeleteError>
    where
        F: FnOnce(&str) -> bool,
    {
        let confirmation = self.request_delete(id)?;
        if !confirm(&confirmation.prompt) {
            self.cancel_delete(confirmation.token);
            return Ok(None);
        }
        self.confirm_delete(confirmation.token).await.map(Some)
    }

    fn write_failed(&self, op: WriteOp, source: ApiError) -> RemoteOutcome {
        let err = WriteError { op, source };
        warn!("roster: {err}; keeping local update");
        self.emit(RosterEvent::WriteFailed {
            op,
            message: err.to_string(),
        });
        RemoteOutcome::Failed(err)
    }

    fn raise_notice(&mut self, remote: &RemoteOutcome, subject: String) {
        self.state.notice = Some(match remote {
            RemoteOutcome::Synced => {
                Notice::new(NoticeKind::Success, format!("{subject} successfully!"))
            }
            RemoteOutcome::Failed(err) => Notice::new(
                NoticeKind::Warning,
                format!("{subject} locally, but the server sync failed: {err}"),
            ),
        });
    }

    fn set_submitting(&mut self, submitting: bool) {
        self.state.submitting = submitting;
        self.emit(RosterEvent::SubmittingChanged(submitting));
    }

    fn set_deleting(&mut self, deleting: Option<StudentId>) {
        self.state.deleting = deleting;
        self.emit(RosterEvent::DeletingChanged(deleting));
    }

    fn emit(&self, event: RosterEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn notice_ttl_from_ms(ttl_ms: u64) -> Duration {
    i64::try_from(ttl_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
