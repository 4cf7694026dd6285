//! Shared error types for the services crate.

use thiserror::Error;

use feedback_core::model::{AnswerError, QuestionError, QuestionId, SessionError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::mailer::MailError;
use crate::password::PasswordError;

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    DuplicateRegistration,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("name is required")]
    EmptyName,
    #[error("reset link is invalid or has expired")]
    InvalidResetToken,
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,
    #[error("name is required")]
    EmptyName,
    #[error("email is already in use")]
    EmailTaken,
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error("only teachers can create sessions")]
    NotTeacher,
    #[error("session not found")]
    NotFound,
    #[error("session belongs to another teacher")]
    NotOwner,
    #[error("invalid session code")]
    InvalidCode,
    #[error("session has expired")]
    Expired,
    #[error("no free session code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `FeedbackService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedbackError {
    #[error("session not found")]
    NotFound,
    #[error("session has expired")]
    Expired,
    #[error("feedback was already submitted for this session")]
    AlreadySubmitted,
    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),
    #[error("question {0} was answered twice")]
    DuplicateAnswer(QuestionId),
    #[error("{missing} question(s) left unanswered")]
    Incomplete { missing: usize },
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("session not found")]
    NotFound,
    #[error("session belongs to another teacher")]
    NotOwner,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("user not found")]
    NotFound,
    #[error("only teachers can be enrolled with")]
    NotATeacher,
    #[error("already enrolled with this teacher")]
    AlreadyEnrolled,
    #[error("enrollment belongs to another student")]
    NotOwner,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
