use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedback_core::model::{
    AssignedSession, Assignment, AssignmentStatus, Email, EnrolledTeacher, Enrollment,
    EnrollmentId, Question, QuestionId, Response, ResponseId, Role, Session, SessionCode,
    SessionId, User, UserId,
};

use crate::repository::{
    AccountRecord, AccountRepository, AssignmentRepository, EnrollmentRepository,
    NewAccountRecord, NewResponseRecord, NewSessionRecord, PasswordResetRecord,
    QuestionRepository, ResponseRepository, SessionRepository, StorageError, UserRepository,
};

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    accounts: BTreeMap<UserId, AccountRecord>,
    users: BTreeMap<UserId, User>,
    resets: HashMap<String, PasswordResetRecord>,
    sessions: BTreeMap<SessionId, Session>,
    questions: BTreeMap<QuestionId, Question>,
    assignments: BTreeMap<(SessionId, UserId), AssignmentStatus>,
    responses: BTreeMap<ResponseId, Response>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory backend for tests and prototyping.
///
/// All tables live behind a single lock, so multi-row writes are atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn newest_first(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
    sessions
}

#[async_trait]
impl AccountRepository for InMemoryRepository {
    async fn insert_account(&self, account: NewAccountRecord) -> Result<UserId, StorageError> {
        let mut state = self.lock()?;
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(state.next_id());
        state.accounts.insert(
            id,
            AccountRecord {
                id,
                email: account.email,
                password_hash: account.password_hash,
                name: account.name,
                role: account.role,
                created_at: account.created_at,
            },
        );
        Ok(id)
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AccountRecord>, StorageError> {
        let state = self.lock()?;
        Ok(state.accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn get_account(&self, id: UserId) -> Result<Option<AccountRecord>, StorageError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    async fn update_account_email(&self, id: UserId, email: &Email) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state
            .accounts
            .values()
            .any(|a| a.id != id && &a.email == email)
        {
            return Err(StorageError::Conflict);
        }
        let account = state.accounts.get_mut(&id).ok_or(StorageError::NotFound)?;
        account.email = email.clone();
        if let Some(user) = state.users.get_mut(&id) {
            user.set_email(email.clone());
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let account = state.accounts.get_mut(&id).ok_or(StorageError::NotFound)?;
        account.password_hash = hash.to_string();
        Ok(())
    }

    async fn delete_account(&self, id: UserId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state.accounts.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        state.users.remove(&id);
        state.resets.retain(|_, r| r.account_id != id);
        state
            .enrollments
            .retain(|_, e| e.student_id != id && e.teacher_id != id);
        Ok(())
    }

    async fn insert_password_reset(&self, reset: PasswordResetRecord) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state.resets.contains_key(&reset.token) {
            return Err(StorageError::Conflict);
        }
        state.resets.insert(reset.token.clone(), reset);
        Ok(())
    }

    async fn consume_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StorageError> {
        let mut state = self.lock()?;
        match state.resets.get_mut(token) {
            Some(reset) if !reset.consumed && reset.expires_at > now => {
                reset.consumed = true;
                Ok(Some(reset.account_id))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn ensure_user(&self, user: &User) -> Result<User, StorageError> {
        let mut state = self.lock()?;
        Ok(state
            .users
            .entry(user.id())
            .or_insert_with(|| user.clone())
            .clone())
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let slot = state.users.get_mut(&user.id()).ok_or(StorageError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StorageError> {
        let state = self.lock()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.role() == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        Ok(users)
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn create_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError> {
        let mut state = self.lock()?;
        let id = SessionId::new(state.next_id());
        let assigned = record.assigned_count();
        let session = Session::from_persisted(
            id,
            record.teacher_id,
            record.title,
            record.description,
            record.code,
            record.due_date,
            Some(record.time_limit),
            record.created_at,
            Some(record.expires_at),
            assigned,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Validate everything before touching state so a failure leaves no rows behind.
        let mut questions = Vec::with_capacity(record.questions.len());
        for draft in record.questions {
            let question_id = QuestionId::new(state.next_id());
            questions.push(
                draft
                    .into_question(question_id, id)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            );
        }

        state.sessions.insert(id, session);
        for question in questions {
            state.questions.insert(question.id(), question);
        }
        for student_id in record.student_ids {
            state
                .assignments
                .entry((id, student_id))
                .or_insert(AssignmentStatus::Pending);
        }
        Ok(id)
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    async fn list_sessions_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<Session>, StorageError> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .sessions
                .values()
                .filter(|s| s.teacher_id() == teacher_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_sessions_by_code(&self, code: &SessionCode) -> Result<Vec<Session>, StorageError> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .sessions
                .values()
                .filter(|s| s.code() == code)
                .cloned()
                .collect(),
        ))
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if !state.sessions.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        state.responses.retain(|_, r| r.session_id != id);
        state.assignments.retain(|(session_id, _), _| *session_id != id);
        state.questions.retain(|_, q| q.session_id() != id);
        state.sessions.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(&self, session_id: SessionId) -> Result<Vec<Question>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .values()
            .filter(|q| q.session_id() == session_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryRepository {
    async fn ensure_assignment(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<bool, StorageError> {
        let mut state = self.lock()?;
        if !state.sessions.contains_key(&session_id) {
            return Err(StorageError::NotFound);
        }
        if state.assignments.contains_key(&(session_id, student_id)) {
            return Ok(false);
        }
        state
            .assignments
            .insert((session_id, student_id), AssignmentStatus::Pending);
        Ok(true)
    }

    async fn get_assignment(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<Option<Assignment>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .assignments
            .get(&(session_id, student_id))
            .map(|status| Assignment {
                session_id,
                student_id,
                status: *status,
            }))
    }

    async fn list_assigned_sessions(
        &self,
        student_id: UserId,
    ) -> Result<Vec<AssignedSession>, StorageError> {
        let state = self.lock()?;
        let mut rows: Vec<AssignedSession> = state
            .assignments
            .iter()
            .filter(|((_, student), _)| *student == student_id)
            .filter_map(|((session_id, _), status)| {
                state.sessions.get(session_id).map(|session| AssignedSession {
                    session: session.clone(),
                    status: *status,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.session
                .created_at()
                .cmp(&a.session.created_at())
                .then_with(|| b.session.id().cmp(&a.session.id()))
        });
        Ok(rows)
    }
}

#[async_trait]
impl ResponseRepository for InMemoryRepository {
    async fn submit_responses(
        &self,
        session_id: SessionId,
        student_id: UserId,
        rows: Vec<NewResponseRecord>,
    ) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if !state.sessions.contains_key(&session_id) {
            return Err(StorageError::NotFound);
        }
        if state
            .responses
            .values()
            .any(|r| r.session_id == session_id && r.student_id == student_id)
        {
            return Err(StorageError::Conflict);
        }
        for row in rows {
            let id = ResponseId::new(state.next_id());
            state.responses.insert(
                id,
                Response {
                    id,
                    session_id,
                    student_id,
                    question_id: row.question_id,
                    answer: row.answer,
                    submitted_at: row.submitted_at,
                },
            );
        }
        state
            .assignments
            .insert((session_id, student_id), AssignmentStatus::Completed);
        Ok(())
    }

    async fn list_responses(&self, session_id: SessionId) -> Result<Vec<Response>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .responses
            .values()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn has_responded(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<bool, StorageError> {
        let state = self.lock()?;
        Ok(state
            .responses
            .values()
            .any(|r| r.session_id == session_id && r.student_id == student_id))
    }

    async fn list_response_pairs_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<(SessionId, UserId)>, StorageError> {
        let state = self.lock()?;
        let owned: HashSet<SessionId> = state
            .sessions
            .values()
            .filter(|s| s.teacher_id() == teacher_id)
            .map(Session::id)
            .collect();
        let mut seen = HashSet::new();
        Ok(state
            .responses
            .values()
            .filter(|r| owned.contains(&r.session_id))
            .map(|r| (r.session_id, r.student_id))
            .filter(|pair| seen.insert(*pair))
            .collect())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(
        &self,
        student_id: UserId,
        teacher_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<EnrollmentId, StorageError> {
        let mut state = self.lock()?;
        if state
            .enrollments
            .values()
            .any(|e| e.student_id == student_id && e.teacher_id == teacher_id)
        {
            return Err(StorageError::Conflict);
        }
        let id = EnrollmentId::new(state.next_id());
        state.enrollments.insert(
            id,
            Enrollment {
                id,
                student_id,
                teacher_id,
                created_at,
            },
        );
        Ok(id)
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        Ok(self.lock()?.enrollments.get(&id).cloned())
    }

    async fn list_enrolled_teachers(
        &self,
        student_id: UserId,
    ) -> Result<Vec<EnrolledTeacher>, StorageError> {
        let state = self.lock()?;
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Ok(state
            .enrollments
            .values()
            .filter(|e| e.student_id == student_id)
            .filter_map(|e| {
                let teacher = state.users.get(&e.teacher_id)?.clone();
                let session_count = state
                    .sessions
                    .values()
                    .filter(|s| s.teacher_id() == e.teacher_id)
                    .count();
                let student_count = state
                    .enrollments
                    .values()
                    .filter(|other| other.teacher_id == e.teacher_id)
                    .count();
                Some(EnrolledTeacher {
                    enrollment_id: e.id,
                    teacher,
                    session_count: count(session_count),
                    student_count: count(student_count),
                    enrolled_at: e.created_at,
                })
            })
            .collect())
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state
            .enrollments
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}
