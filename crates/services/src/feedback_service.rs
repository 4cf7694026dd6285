use std::collections::HashMap;
use std::sync::Arc;

use feedback_core::lifecycle::{is_expired, validate_session_code};
use feedback_core::model::{Answer, Question, QuestionId, Session, SessionCode, SessionId, UserId};
use storage::repository::{
    NewResponseRecord, QuestionRepository, ResponseRepository, SessionRepository, StorageError,
};

use crate::Clock;
use crate::error::FeedbackError;

/// What a student sees after entering a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackForm {
    /// The code is unknown or every session carrying it has closed.
    Expired,
    AlreadySubmitted,
    Ready {
        session: Session,
        questions: Vec<Question>,
    },
}

/// Serves the feedback form and records a student's single submission.
#[derive(Clone)]
pub struct FeedbackService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    questions: Arc<dyn QuestionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl FeedbackService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        questions: Arc<dyn QuestionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            questions,
            responses,
        }
    }

    /// Resolve a join code into the form a student should see.
    ///
    /// Codes may arrive with a leading `:` from route parameters; it is ignored.
    /// When several sessions share the code the newest one decides, as in
    /// [`SessionService::join_by_code`](crate::SessionService::join_by_code).
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Storage` if a lookup fails.
    pub async fn open_form(
        &self,
        student_id: UserId,
        code: &str,
    ) -> Result<FeedbackForm, FeedbackError> {
        let code = code.trim();
        let code = code.strip_prefix(':').unwrap_or(code);
        let Ok(code) = SessionCode::new(code) else {
            return Ok(FeedbackForm::Expired);
        };

        let candidates = self.sessions.find_sessions_by_code(&code).await?;
        if !validate_session_code(code.as_str(), &candidates, self.clock.now()) {
            return Ok(FeedbackForm::Expired);
        }
        let Some(session) = candidates.into_iter().next() else {
            return Ok(FeedbackForm::Expired);
        };

        if self.responses.has_responded(session.id(), student_id).await? {
            return Ok(FeedbackForm::AlreadySubmitted);
        }

        let questions = self.questions.list_questions(session.id()).await?;
        Ok(FeedbackForm::Ready { session, questions })
    }

    /// Validate a full answer set and store it in one pass.
    ///
    /// Every question must be answered, except multiple-choice questions that
    /// have no options to pick from.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Expired` or `FeedbackError::AlreadySubmitted`
    /// when the session no longer accepts this student's answers,
    /// `FeedbackError::UnknownQuestion`, `FeedbackError::DuplicateAnswer` or
    /// `FeedbackError::Answer` for invalid answers, and
    /// `FeedbackError::Incomplete` if questions were skipped.
    pub async fn submit(
        &self,
        student_id: UserId,
        session_id: SessionId,
        answers: Vec<(QuestionId, Answer)>,
    ) -> Result<(), FeedbackError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(FeedbackError::NotFound)?;
        let now = self.clock.now();
        if is_expired(&session, now) {
            tracing::warn!(session_id = session_id.value(), "submission rejected: expired");
            return Err(FeedbackError::Expired);
        }
        if self.responses.has_responded(session_id, student_id).await? {
            return Err(FeedbackError::AlreadySubmitted);
        }

        let questions = self.questions.list_questions(session_id).await?;
        let mut by_question: HashMap<QuestionId, Answer> = HashMap::with_capacity(answers.len());
        for (question_id, answer) in answers {
            let question = questions
                .iter()
                .find(|q| q.id() == question_id)
                .ok_or(FeedbackError::UnknownQuestion(question_id))?;
            answer.validate_for(question)?;
            if by_question.insert(question_id, answer).is_some() {
                return Err(FeedbackError::DuplicateAnswer(question_id));
            }
        }

        let missing = questions
            .iter()
            .filter(|q| !q.is_malformed() && !by_question.contains_key(&q.id()))
            .count();
        if missing > 0 {
            return Err(FeedbackError::Incomplete { missing });
        }

        let rows: Vec<NewResponseRecord> = questions
            .iter()
            .filter_map(|q| {
                by_question.get(&q.id()).map(|answer| NewResponseRecord {
                    question_id: q.id(),
                    answer: answer.to_stored(),
                    submitted_at: now,
                })
            })
            .collect();
        let count = rows.len();

        self.responses
            .submit_responses(session_id, student_id, rows)
            .await
            .map_err(|e| match e {
                StorageError::Conflict => FeedbackError::AlreadySubmitted,
                StorageError::NotFound => FeedbackError::NotFound,
                other => FeedbackError::Storage(other),
            })?;
        tracing::info!(
            session_id = session_id.value(),
            student_id = student_id.value(),
            answers = count,
            "feedback submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use feedback_core::model::{
        AnswerError, AssignmentStatus, DefaultQuestionSelection, Email, QuestionDraft,
        QuestionKind, Role, User,
    };
    use feedback_core::time::{fixed_clock, fixed_now};
    use storage::repository::{AssignmentRepository, InMemoryRepository};

    use crate::session_service::{SessionDraft, SessionService};

    fn teacher() -> User {
        User::new(
            UserId::new(1),
            "Grace",
            Email::new("grace@school.edu").unwrap(),
            Role::Teacher,
            fixed_now(),
        )
    }

    fn feedback(repo: &InMemoryRepository, clock: Clock) -> FeedbackService {
        FeedbackService::new(
            clock,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn session_with(repo: &InMemoryRepository, custom: Vec<QuestionDraft>) -> Session {
        let sessions = SessionService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let mut draft = SessionDraft::new("Iterators");
        draft.defaults = DefaultQuestionSelection::none();
        draft.custom_questions = custom;
        draft.student_ids = vec![UserId::new(5)];
        sessions.create_session(&teacher(), draft).await.unwrap()
    }

    fn answers_for(questions: &[Question]) -> Vec<(QuestionId, Answer)> {
        questions
            .iter()
            .map(|q| {
                let answer = match q.kind() {
                    QuestionKind::Rating { .. } => Answer::Rating(4),
                    QuestionKind::MultipleChoice { options } => Answer::Choice(options[0].clone()),
                    QuestionKind::Text => Answer::Text("more examples".into()),
                };
                (q.id(), answer)
            })
            .collect()
    }

    #[tokio::test]
    async fn open_form_strips_route_colon_and_returns_questions() {
        let repo = InMemoryRepository::new();
        let session = session_with(&repo, vec![QuestionDraft::custom("Notes", QuestionKind::Text)]).await;
        let svc = feedback(&repo, fixed_clock());

        let form = svc
            .open_form(UserId::new(5), &format!(":{}", session.code()))
            .await
            .unwrap();
        let (found, questions) = match form {
            FeedbackForm::Ready { session, questions } => (session, questions),
            other => panic!("expected a ready form, got {other:?}"),
        };
        assert_eq!(found.id(), session.id());
        assert_eq!(questions.len(), 2);

        assert_eq!(
            svc.open_form(UserId::new(5), "000000").await.unwrap(),
            FeedbackForm::Expired
        );
        assert_eq!(
            svc.open_form(UserId::new(5), "abc").await.unwrap(),
            FeedbackForm::Expired
        );
    }

    #[tokio::test]
    async fn submit_once_then_form_reports_already_submitted() {
        let repo = InMemoryRepository::new();
        let session = session_with(&repo, vec![]).await;
        let svc = feedback(&repo, fixed_clock());
        let student = UserId::new(5);
        let questions = repo.list_questions(session.id()).await.unwrap();

        svc.submit(student, session.id(), answers_for(&questions))
            .await
            .unwrap();

        let assignment = repo.get_assignment(session.id(), student).await.unwrap().unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Completed);
        assert_eq!(
            svc.open_form(student, session.code().as_str()).await.unwrap(),
            FeedbackForm::AlreadySubmitted
        );
        assert!(matches!(
            svc.submit(student, session.id(), answers_for(&questions)).await,
            Err(FeedbackError::AlreadySubmitted)
        ));
        assert_eq!(repo.list_responses(session.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_rejects_incomplete_and_out_of_range_answers() {
        let repo = InMemoryRepository::new();
        let session = session_with(&repo, vec![QuestionDraft::custom("Notes", QuestionKind::Text)]).await;
        let svc = feedback(&repo, fixed_clock());
        let questions = repo.list_questions(session.id()).await.unwrap();
        let rating = questions[0].id();

        let partial = svc
            .submit(UserId::new(5), session.id(), vec![(rating, Answer::Rating(3))])
            .await;
        assert!(matches!(partial, Err(FeedbackError::Incomplete { missing: 1 })));

        let mut out_of_range = answers_for(&questions);
        out_of_range[0].1 = Answer::Rating(6);
        assert!(matches!(
            svc.submit(UserId::new(5), session.id(), out_of_range).await,
            Err(FeedbackError::Answer(AnswerError::RatingOutOfRange { value: 6, max: 5 }))
        ));

        let mut stray = answers_for(&questions);
        stray.push((QuestionId::new(999), Answer::Rating(1)));
        assert!(matches!(
            svc.submit(UserId::new(5), session.id(), stray).await,
            Err(FeedbackError::UnknownQuestion(_))
        ));
        assert!(repo.list_responses(session.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_refuse_forms_and_submissions() {
        let repo = InMemoryRepository::new();
        let session = session_with(&repo, vec![]).await;
        let questions = repo.list_questions(session.id()).await.unwrap();
        let late = feedback(&repo, fixed_clock().advanced(Duration::minutes(31)));

        assert_eq!(
            late.open_form(UserId::new(5), session.code().as_str())
                .await
                .unwrap(),
            FeedbackForm::Expired
        );
        assert!(matches!(
            late.submit(UserId::new(5), session.id(), answers_for(&questions))
                .await,
            Err(FeedbackError::Expired)
        ));
    }
}
