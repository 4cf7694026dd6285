use std::sync::Arc;

use chrono::NaiveDate;
use rand::Rng;

use feedback_core::lifecycle::{
    filter_active_sessions_for_students, is_expired, validate_session_code,
};
use feedback_core::model::{
    AssignedSession, DefaultQuestionSelection, QuestionDraft, Session, SessionCode, SessionId,
    TimeLimit, User, UserId,
};
use feedback_core::results::{DashboardStats, dashboard_stats};
use storage::repository::{
    AssignmentRepository, NewSessionRecord, ResponseRepository, SessionRepository, StorageError,
};

use crate::Clock;
use crate::error::SessionServiceError;

/// How many random codes are tried before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 32;

/// Everything a teacher fills in on the create-session form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub time_limit: TimeLimit,
    pub defaults: DefaultQuestionSelection,
    pub custom_questions: Vec<QuestionDraft>,
    pub student_ids: Vec<UserId>,
}

impl SessionDraft {
    /// Draft with every default question on, the default time limit and no students.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date: None,
            time_limit: TimeLimit::default(),
            defaults: DefaultQuestionSelection::all(),
            custom_questions: Vec::new(),
            student_ids: Vec::new(),
        }
    }

    /// Default questions followed by the non-blank custom ones.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingOptions` for a multiple-choice question
    /// left without options.
    pub fn questions(&self) -> Result<Vec<QuestionDraft>, feedback_core::model::QuestionError> {
        let mut questions = self.defaults.drafts();
        for draft in &self.custom_questions {
            if let Some(q) = draft.clone().normalize()? {
                questions.push(q);
            }
        }
        Ok(questions)
    }

    fn distinct_students(&self) -> Vec<UserId> {
        let mut ids = Vec::with_capacity(self.student_ids.len());
        for id in &self.student_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// A teacher's sessions together with their response statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherDashboard {
    pub sessions: Vec<Session>,
    pub stats: DashboardStats,
}

/// Owns the session lifecycle: creation, joining by code, listing and deletion.
#[derive(Clone)]
pub struct SessionService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl SessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            assignments,
            responses,
        }
    }

    /// Validate the draft, pick a free join code and store the session with
    /// its questions and assignments in one write.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotTeacher` for student callers,
    /// `SessionServiceError::Session` or `SessionServiceError::Question` for
    /// invalid input, and `SessionServiceError::CodeSpaceExhausted` if no
    /// unused code was found.
    pub async fn create_session(
        &self,
        teacher: &User,
        draft: SessionDraft,
    ) -> Result<Session, SessionServiceError> {
        if !teacher.is_teacher() {
            return Err(SessionServiceError::NotTeacher);
        }
        let questions = draft.questions()?;
        let students = draft.distinct_students();
        let assigned = u32::try_from(students.len()).unwrap_or(u32::MAX);

        let now = self.clock.now();
        let code = self.generate_code().await?;
        let session = Session::new(
            SessionId::new(0),
            teacher.id(),
            draft.title,
            draft.description,
            code,
            draft.due_date,
            draft.time_limit,
            now,
            assigned,
        )?;

        let question_count = questions.len();
        let id = self
            .sessions
            .create_session(NewSessionRecord::from_session(&session, questions, students))
            .await?;

        tracing::info!(
            session_id = id.value(),
            teacher_id = teacher.id().value(),
            code = session.code().as_str(),
            questions = question_count,
            students = assigned,
            "session created"
        );
        Ok(session.with_id(id))
    }

    /// Random code not carried by any session that is still open.
    async fn generate_code(&self) -> Result<SessionCode, SessionServiceError> {
        let now = self.clock.now();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = rand::rng().random_range(SessionCode::MIN..=SessionCode::MAX);
            let code = SessionCode::from_number(candidate)?;
            let holders = self.sessions.find_sessions_by_code(&code).await?;
            if holders.iter().all(|s| is_expired(s, now)) {
                return Ok(code);
            }
            tracing::debug!(code = code.as_str(), "session code in use, retrying");
        }
        Err(SessionServiceError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` if the session does not exist.
    pub async fn get_session(&self, id: SessionId) -> Result<Session, SessionServiceError> {
        self.sessions
            .get_session(id)
            .await?
            .ok_or(SessionServiceError::NotFound)
    }

    /// Delete a session with its questions, assignments and responses.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` for unknown sessions and
    /// `SessionServiceError::NotOwner` if another teacher owns it.
    pub async fn delete_session(
        &self,
        teacher_id: UserId,
        session_id: SessionId,
    ) -> Result<(), SessionServiceError> {
        let session = self.get_session(session_id).await?;
        if session.teacher_id() != teacher_id {
            tracing::warn!(
                session_id = session_id.value(),
                teacher_id = teacher_id.value(),
                "delete rejected: not the owner"
            );
            return Err(SessionServiceError::NotOwner);
        }

        self.sessions
            .delete_session(session_id)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => SessionServiceError::NotFound,
                other => SessionServiceError::Storage(other),
            })?;
        tracing::info!(session_id = session_id.value(), "session deleted");
        Ok(())
    }

    /// Look up an open session by code and make sure the student is assigned to it.
    ///
    /// Codes are only reused once their holder has expired, so when several
    /// sessions share a code the newest one decides.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::InvalidCode` for malformed or unknown
    /// codes and `SessionServiceError::Expired` if the newest session with the
    /// code has closed.
    pub async fn join_by_code(
        &self,
        student_id: UserId,
        code: &str,
    ) -> Result<Session, SessionServiceError> {
        let code = SessionCode::new(code.trim()).map_err(|_| SessionServiceError::InvalidCode)?;
        let candidates = self.sessions.find_sessions_by_code(&code).await?;
        let open = validate_session_code(code.as_str(), &candidates, self.clock.now());
        let Some(session) = candidates.into_iter().next() else {
            tracing::warn!(code = code.as_str(), "join rejected: unknown code");
            return Err(SessionServiceError::InvalidCode);
        };
        if !open {
            tracing::warn!(code = code.as_str(), "join rejected: session expired");
            return Err(SessionServiceError::Expired);
        }

        let inserted = self
            .assignments
            .ensure_assignment(session.id(), student_id)
            .await?;
        tracing::info!(
            session_id = session.id().value(),
            student_id = student_id.value(),
            inserted,
            "joined session"
        );
        Ok(session)
    }

    /// Sessions (newest first) and dashboard numbers for a teacher.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if a query fails.
    pub async fn teacher_dashboard(
        &self,
        teacher_id: UserId,
    ) -> Result<TeacherDashboard, SessionServiceError> {
        let sessions = self.sessions.list_sessions_for_teacher(teacher_id).await?;
        let pairs = self
            .responses
            .list_response_pairs_for_teacher(teacher_id)
            .await?;
        let stats = dashboard_stats(&sessions, &pairs, self.clock.now());
        Ok(TeacherDashboard { sessions, stats })
    }

    /// Every session offered to a student, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the query fails.
    pub async fn assigned_sessions(
        &self,
        student_id: UserId,
    ) -> Result<Vec<AssignedSession>, SessionServiceError> {
        Ok(self.assignments.list_assigned_sessions(student_id).await?)
    }

    /// Assigned sessions that are neither expired nor completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the query fails.
    pub async fn active_sessions(
        &self,
        student_id: UserId,
    ) -> Result<Vec<AssignedSession>, SessionServiceError> {
        let assigned = self.assigned_sessions(student_id).await?;
        Ok(filter_active_sessions_for_students(
            &assigned,
            self.clock.now(),
        ))
    }
}
