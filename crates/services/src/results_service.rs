use std::sync::Arc;

use feedback_core::model::{Question, Session, SessionId, UserId};
use feedback_core::results::{SessionResults, aggregate};
use storage::repository::{QuestionRepository, ResponseRepository, SessionRepository};

use crate::error::ResultsError;

/// A session with its questions and aggregated answers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session: Session,
    pub questions: Vec<Question>,
    pub results: SessionResults,
}

#[derive(Clone)]
pub struct ResultsService {
    sessions: Arc<dyn SessionRepository>,
    questions: Arc<dyn QuestionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl ResultsService {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        questions: Arc<dyn QuestionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            sessions,
            questions,
            responses,
        }
    }

    /// Load a session's questions and responses and aggregate them.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::NotFound` for unknown sessions and
    /// `ResultsError::NotOwner` if another teacher owns the session.
    pub async fn session_report(
        &self,
        teacher_id: UserId,
        session_id: SessionId,
    ) -> Result<SessionReport, ResultsError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or(ResultsError::NotFound)?;
        if session.teacher_id() != teacher_id {
            tracing::warn!(
                session_id = session_id.value(),
                teacher_id = teacher_id.value(),
                "results rejected: not the owner"
            );
            return Err(ResultsError::NotOwner);
        }

        let questions = self.questions.list_questions(session_id).await?;
        let responses = self.responses.list_responses(session_id).await?;
        tracing::debug!(
            session_id = session_id.value(),
            responses = responses.len(),
            "aggregating results"
        );
        let results = aggregate(&session, &questions, &responses);
        Ok(SessionReport {
            session,
            questions,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use feedback_core::model::{
        Answer, DefaultQuestionSelection, Email, QuestionDraft, QuestionKind, Role, User,
    };
    use feedback_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    use crate::feedback_service::FeedbackService;
    use crate::session_service::{SessionDraft, SessionService};

    #[tokio::test]
    async fn report_aggregates_submitted_answers_for_the_owner() {
        let repo = InMemoryRepository::new();
        let clock = fixed_clock();
        let teacher = User::new(
            UserId::new(1),
            "Grace",
            Email::new("grace@school.edu").unwrap(),
            Role::Teacher,
            fixed_now(),
        );
        let sessions = SessionService::new(
            clock,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let feedback = FeedbackService::new(
            clock,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let results = ResultsService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );

        let mut draft = SessionDraft::new("Pattern matching");
        draft.defaults = DefaultQuestionSelection::none();
        draft.custom_questions = vec![QuestionDraft::custom(
            "Best part?",
            QuestionKind::MultipleChoice {
                options: vec!["A".into(), "B".into()],
            },
        )];
        draft.student_ids = (10..14).map(UserId::new).collect();
        let session = sessions.create_session(&teacher, draft).await.unwrap();
        let questions = repo.list_questions(session.id()).await.unwrap();

        for (student, rating, choice) in [(10, 5, "A"), (11, 4, "A"), (12, 3, "B")] {
            feedback
                .submit(
                    UserId::new(student),
                    session.id(),
                    vec![
                        (questions[0].id(), Answer::Rating(rating)),
                        (questions[1].id(), Answer::Choice(choice.into())),
                    ],
                )
                .await
                .unwrap();
        }

        let report = results
            .session_report(teacher.id(), session.id())
            .await
            .unwrap();
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.results.rating.len(), 1);
        assert!((report.results.rating[0].average - 4.0).abs() < f64::EPSILON);
        assert_eq!(
            report.results.choice[0].counts,
            vec![("A".to_string(), 2), ("B".to_string(), 1)]
        );
        assert_eq!(report.results.assigned, 4);
        assert_eq!(report.results.fully_responded, 3);

        assert!(matches!(
            results.session_report(UserId::new(2), session.id()).await,
            Err(ResultsError::NotOwner)
        ));
    }
}
