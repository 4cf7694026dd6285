use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use feedback_core::model::{
    AssignedSession, Assignment, Email, EnrolledTeacher, Enrollment, EnrollmentId, Question,
    QuestionDraft, QuestionId, Response, Role, Session, SessionCode, SessionId, TimeLimit, User,
    UserId,
};
use thiserror::Error;

pub use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Credentials row. Shares its id with the profile created on first sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Profile built from the metadata captured at sign-up.
    #[must_use]
    pub fn to_profile(&self) -> User {
        User::new(
            self.id,
            self.name.clone(),
            self.email.clone(),
            self.role,
            self.created_at,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountRecord {
    pub email: Email,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetRecord {
    pub token: String,
    pub account_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

/// Everything written when a teacher creates a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionRecord {
    pub teacher_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub code: SessionCode,
    pub due_date: Option<NaiveDate>,
    pub time_limit: TimeLimit,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub questions: Vec<QuestionDraft>,
    pub student_ids: Vec<UserId>,
}

impl NewSessionRecord {
    /// Builds the record from a validated session. The session's id is ignored.
    #[must_use]
    pub fn from_session(
        session: &Session,
        questions: Vec<QuestionDraft>,
        student_ids: Vec<UserId>,
    ) -> Self {
        Self {
            teacher_id: session.teacher_id(),
            title: session.title().to_string(),
            description: session.description().map(ToString::to_string),
            code: session.code().clone(),
            due_date: session.due_date(),
            time_limit: session.time_limit().unwrap_or_default(),
            created_at: session.created_at(),
            expires_at: session
                .expires_at()
                .unwrap_or_else(|| session.created_at() + session.time_limit().unwrap_or_default().duration()),
            questions,
            student_ids,
        }
    }

    /// Number of distinct students, which becomes the session's assigned count.
    #[must_use]
    pub fn assigned_count(&self) -> u32 {
        let mut ids = self.student_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        u32::try_from(ids.len()).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponseRecord {
    pub question_id: QuestionId,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Store a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the e-mail is already registered.
    async fn insert_account(&self, account: NewAccountRecord) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AccountRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_account(&self, id: UserId) -> Result<Option<AccountRecord>, StorageError>;

    /// Change the e-mail on the account and, when present, its profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown accounts and
    /// `StorageError::Conflict` if the address belongs to someone else.
    async fn update_account_email(&self, id: UserId, email: &Email) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown accounts.
    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), StorageError>;

    /// Remove the account together with its profile, enrollments and reset tokens.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown accounts.
    async fn delete_account(&self, id: UserId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the token cannot be stored.
    async fn insert_password_reset(&self, reset: PasswordResetRecord) -> Result<(), StorageError>;

    /// Mark a reset token as used and return its account.
    ///
    /// Returns `None` if the token is unknown, already consumed or expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update fails.
    async fn consume_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the profile if no row exists for its id and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn ensure_user(&self, user: &User) -> Result<User, StorageError>;

    /// Persist changes to an existing profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist.
    async fn update_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Profiles with the given role, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StorageError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Write the session, its questions and its assignments atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any part of the write fails; nothing is kept in that case.
    async fn create_session(&self, session: NewSessionRecord) -> Result<SessionId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError>;

    /// Sessions owned by a teacher, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_sessions_for_teacher(&self, teacher_id: UserId)
    -> Result<Vec<Session>, StorageError>;

    /// Sessions carrying a join code, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn find_sessions_by_code(&self, code: &SessionCode) -> Result<Vec<Session>, StorageError>;

    /// Delete responses, assignments, questions and the session in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Questions of a session in authored order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails or a row cannot be decoded.
    async fn list_questions(&self, session_id: SessionId) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Insert a pending assignment unless one exists. Returns `true` when inserted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn ensure_assignment(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_assignment(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<Option<Assignment>, StorageError>;

    /// Every session offered to a student, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_assigned_sessions(
        &self,
        student_id: UserId,
    ) -> Result<Vec<AssignedSession>, StorageError>;
}

#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Store one submission pass and mark the assignment completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the student already has responses
    /// for this session.
    async fn submit_responses(
        &self,
        session_id: SessionId,
        student_id: UserId,
        rows: Vec<NewResponseRecord>,
    ) -> Result<(), StorageError>;

    /// Response rows of a session in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_responses(&self, session_id: SessionId) -> Result<Vec<Response>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn has_responded(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<bool, StorageError>;

    /// Distinct `(session, student)` pairs with responses across a teacher's sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_response_pairs_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<(SessionId, UserId)>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the pair is already enrolled.
    async fn insert_enrollment(
        &self,
        student_id: UserId,
        teacher_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<EnrollmentId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError>;

    /// Teachers a student is enrolled with, including their session and student counts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_enrolled_teachers(
        &self,
        student_id: UserId,
    ) -> Result<Vec<EnrolledTeacher>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError>;
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub accounts: Arc<dyn AccountRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub responses: Arc<dyn ResponseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repo(InMemoryRepository::new())
    }

    /// Wire every repository to clones of the same backend.
    pub(crate) fn from_repo<R>(repo: R) -> Self
    where
        R: AccountRepository
            + UserRepository
            + SessionRepository
            + QuestionRepository
            + AssignmentRepository
            + ResponseRepository
            + EnrollmentRepository
            + Clone
            + 'static,
    {
        Self {
            accounts: Arc::new(repo.clone()),
            users: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            assignments: Arc::new(repo.clone()),
            responses: Arc::new(repo.clone()),
            enrollments: Arc::new(repo),
        }
    }
}
