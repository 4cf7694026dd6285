use anyhow::Context;
use feedback_core::model::{QuestionDraft, QuestionKind, Role, SessionCode, TimeLimit, User};
use services::{AppServices, AuthError, EnrollmentError, SessionDraft};

pub const DEMO_PASSWORD: &str = "feedback-demo";
pub const DEMO_TEACHER_EMAIL: &str = "teacher@example.com";
pub const DEMO_STUDENT_EMAIL: &str = "student@example.com";
pub const SAMPLE_SESSION_TITLE: &str = "Intro to ownership";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub teacher: User,
    pub student: User,
    /// Code of the sample session, `None` if the teacher already had sessions.
    pub created_code: Option<SessionCode>,
}

/// Demo teacher and student, enrolled together, plus one open sample session.
/// Running it twice leaves existing data alone.
///
/// # Errors
///
/// Returns an error if any account, enrollment or session write fails.
pub async fn seed(services: &AppServices) -> anyhow::Result<SeedReport> {
    let teacher = ensure_account(services, DEMO_TEACHER_EMAIL, "Demo Teacher", Role::Teacher).await?;
    let student = ensure_account(services, DEMO_STUDENT_EMAIL, "Demo Student", Role::Student).await?;

    match services.enrollments().enroll(student.id(), teacher.id()).await {
        Ok(_) | Err(EnrollmentError::AlreadyEnrolled) => {}
        Err(err) => return Err(err).context("enrolling demo student"),
    }

    let dashboard = services
        .sessions()
        .teacher_dashboard(teacher.id())
        .await
        .context("loading demo teacher sessions")?;
    let created_code = if dashboard.sessions.is_empty() {
        let session = services
            .sessions()
            .create_session(&teacher, sample_draft(&student)?)
            .await
            .context("creating sample session")?;
        tracing::info!(code = %session.code(), "sample session created");
        Some(session.code().clone())
    } else {
        tracing::info!("demo teacher already has sessions; skipping sample");
        None
    };

    Ok(SeedReport {
        teacher,
        student,
        created_code,
    })
}

async fn ensure_account(
    services: &AppServices,
    email: &str,
    name: &str,
    role: Role,
) -> anyhow::Result<User> {
    let auth = services.auth();
    match auth.sign_up(email, DEMO_PASSWORD, name, role).await {
        Ok(_) => tracing::info!(email, role = role.as_str(), "demo account created"),
        Err(AuthError::DuplicateRegistration) => {
            tracing::info!(email, "demo account already exists");
        }
        Err(err) => return Err(err).with_context(|| format!("creating {email}")),
    }
    // Signing in creates the profile row.
    let session = auth
        .sign_in(email, DEMO_PASSWORD)
        .await
        .with_context(|| format!("signing in {email}; was its password changed?"))?;
    auth.sign_out();
    Ok(session.user)
}

fn sample_draft(student: &User) -> anyhow::Result<SessionDraft> {
    let mut draft = SessionDraft::new(SAMPLE_SESSION_TITLE);
    draft.description = Some("Moves, borrows and the borrow checker.".to_string());
    draft.time_limit = TimeLimit::from_minutes(24 * 60)?;
    draft.student_ids = vec![student.id()];
    draft.custom_questions = vec![
        QuestionDraft {
            text: "Which topic needs another pass?".to_string(),
            kind: QuestionKind::MultipleChoice {
                options: vec![
                    "Moves".to_string(),
                    "Shared borrows".to_string(),
                    "Mutable borrows".to_string(),
                    "Lifetimes".to_string(),
                ],
            },
            is_default: false,
        },
        QuestionDraft {
            text: "Anything else you want to tell us?".to_string(),
            kind: QuestionKind::Text,
            is_default: false,
        },
    ];
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use feedback_core::time::fixed_clock;
    use services::FeedbackForm;

    use super::*;

    #[tokio::test]
    async fn seed_creates_accounts_enrollment_and_session() {
        let services = AppServices::in_memory(fixed_clock());
        let report = seed(&services).await.unwrap();

        assert!(report.teacher.is_teacher());
        assert_eq!(report.student.role(), Role::Student);
        let code = report.created_code.expect("sample session");

        let teachers = services
            .enrollments()
            .enrolled_teachers(report.student.id())
            .await
            .unwrap();
        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].teacher.id(), report.teacher.id());

        let form = services
            .feedback()
            .open_form(report.student.id(), code.as_str())
            .await
            .unwrap();
        let FeedbackForm::Ready { questions, .. } = form else {
            panic!("sample session should be open");
        };
        assert_eq!(questions.len(), 7);
        assert!(services.auth().current_session().is_none());
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_session() {
        let services = AppServices::in_memory(fixed_clock());
        let first = seed(&services).await.unwrap();
        let second = seed(&services).await.unwrap();

        assert_eq!(first.teacher.id(), second.teacher.id());
        assert!(second.created_code.is_none());
        let dashboard = services
            .sessions()
            .teacher_dashboard(first.teacher.id())
            .await
            .unwrap();
        assert_eq!(dashboard.sessions.len(), 1);
    }
}
