use std::sync::Arc;

use chrono::Duration;
use feedback_core::model::{
    Answer, DEFAULT_QUESTIONS, QuestionDraft, QuestionKind, Role, Session, SessionCode, SessionId,
    UserId,
};
use feedback_core::time::fixed_now;
use services::{Clock, SessionDraft};
use storage::repository::{
    NewSessionRecord, QuestionRepository, SessionRepository, Storage, StorageError,
};

use super::test_harness::{Classroom, ViewKind};

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_invites_sign_in() {
    let classroom = Classroom::new();
    let mut harness = classroom.mount(ViewKind::Home);
    let html = harness.settle().await;
    assert!(html.contains("Sign in or create an account"), "missing cta in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn teacher_dashboard_smoke_lists_session_code() {
    let classroom = Classroom::new();
    let teacher = classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    let session = classroom
        .create_session(&teacher, "Ownership", &[student.id()])
        .await;
    classroom.sign_in("grace@school.edu").await;

    let mut harness = classroom.mount(ViewKind::TeacherDashboard);
    let html = harness.settle().await;
    assert!(html.contains("Ownership"), "missing title in {html}");
    let code = format!("Code {}", session.code());
    assert!(html.contains(&code), "missing {code} in {html}");
    assert!(html.contains("Responses: 0 / 1"), "missing response count in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn teacher_dashboard_smoke_rejects_students() {
    let classroom = Classroom::new();
    classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::TeacherDashboard);
    let html = harness.settle().await;
    assert!(html.contains("This page is for teachers"), "missing guard in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn student_dashboard_smoke_lists_assigned_session() {
    let classroom = Classroom::new();
    let teacher = classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    classroom
        .create_session(&teacher, "Lifetimes", &[student.id()])
        .await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::StudentDashboard);
    let html = harness.settle().await;
    assert!(html.contains("Lifetimes"), "missing session in {html}");
    assert!(html.contains("Give feedback"), "missing action in {html}");
    assert!(html.contains("Join with a code"), "missing join form in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn student_dashboard_smoke_hides_completed_and_expired_sessions() {
    let classroom = Classroom::new();
    let teacher = classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    let done = classroom
        .create_session(&teacher, "AlreadyAnswered", &[student.id()])
        .await;
    submit_all(&classroom, student.id(), &done).await;

    // Created two hours ago with the default 30 minute limit.
    let mut draft = SessionDraft::new("LongClosed");
    draft.student_ids = vec![student.id()];
    classroom
        .services_at(Clock::fixed(fixed_now() - Duration::hours(2)))
        .sessions()
        .create_session(&teacher, draft)
        .await
        .expect("create expired session");

    classroom
        .create_session(&teacher, "StillOpen", &[student.id()])
        .await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::StudentDashboard);
    let html = harness.settle().await;
    assert!(html.contains("StillOpen"), "missing open session in {html}");
    assert!(!html.contains("AlreadyAnswered"), "completed session shown in {html}");
    assert!(!html.contains("LongClosed"), "expired session shown in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn student_dashboard_smoke_empty_once_everything_is_answered() {
    let classroom = Classroom::new();
    let teacher = classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    let session = classroom
        .create_session(&teacher, "Closures", &[student.id()])
        .await;
    submit_all(&classroom, student.id(), &session).await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::StudentDashboard);
    let html = harness.settle().await;
    assert!(!html.contains("Closures"), "completed session shown in {html}");
    assert!(html.contains("No open sessions right now"), "missing empty state in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn feedback_view_smoke_renders_first_question() {
    let classroom = Classroom::new();
    let teacher = classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    let session = classroom
        .create_session(&teacher, "Traits", &[student.id()])
        .await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::Feedback(session.code().to_string()));
    let html = harness.settle().await;
    assert!(html.contains("Traits"), "missing title in {html}");
    assert!(html.contains(DEFAULT_QUESTIONS[0]), "missing question in {html}");
    let progress = format!("Question 1 of {}", DEFAULT_QUESTIONS.len());
    assert!(html.contains(&progress), "missing {progress} in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn feedback_view_smoke_reports_unknown_code_as_closed() {
    let classroom = Classroom::new();
    classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::Feedback("999999".to_string()));
    let html = harness.settle().await;
    assert!(html.contains("Session closed"), "missing closed state in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn results_view_smoke_renders_submitted_answers() {
    let classroom = Classroom::new();
    let teacher = classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    let mut draft = SessionDraft::new("Macros");
    draft.student_ids = vec![student.id()];
    draft.custom_questions = vec![QuestionDraft {
        text: "What should we cover next?".to_string(),
        kind: QuestionKind::Text,
        is_default: false,
    }];
    let session = classroom
        .services
        .sessions()
        .create_session(&teacher, draft)
        .await
        .expect("create session");
    submit_all(&classroom, student.id(), &session).await;
    classroom.sign_in("grace@school.edu").await;

    let mut harness = classroom.mount(ViewKind::Results(session.id().value()));
    let html = harness.settle().await;
    assert!(html.contains("Macros"), "missing title in {html}");
    assert!(html.contains("1 of 1"), "missing respondents in {html}");
    assert!(html.contains("5.0 / 5"), "missing average in {html}");
    assert!(html.contains("Written answers"), "missing text section in {html}");
    assert!(html.contains("more examples"), "missing text answer in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn profile_view_smoke_requires_sign_in() {
    let classroom = Classroom::new();
    let mut harness = classroom.mount(ViewKind::Profile);
    let html = harness.settle().await;
    assert!(html.contains("Please sign in to continue."), "missing prompt in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn profile_view_smoke_shows_current_name() {
    let classroom = Classroom::new();
    classroom
        .register("alan@school.edu", "Alan Turing", Role::Student)
        .await;
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::Profile);
    let html = harness.settle().await;
    assert!(html.contains("Alan Turing"), "missing name in {html}");
    assert!(html.contains("Delete account"), "missing danger zone in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn teachers_view_smoke_splits_enrolled_and_available() {
    let classroom = Classroom::new();
    let grace = classroom
        .register("grace@school.edu", "Grace Hopper", Role::Teacher)
        .await;
    classroom
        .register("barbara@school.edu", "Barbara Liskov", Role::Teacher)
        .await;
    let student = classroom
        .register("alan@school.edu", "Alan", Role::Student)
        .await;
    classroom
        .services
        .enrollments()
        .enroll(student.id(), grace.id())
        .await
        .expect("enroll");
    classroom.sign_in("alan@school.edu").await;

    let mut harness = classroom.mount(ViewKind::Teachers);
    let html = harness.settle().await;
    let enrolled = html.find("Grace Hopper").expect("enrolled teacher listed");
    let available = html.find("Barbara Liskov").expect("available teacher listed");
    let heading = html.find("Available teachers").expect("available heading");
    assert!(enrolled < heading && heading < available, "wrong grouping in {html}");
    assert!(html.contains("Leave"), "missing unenroll in {html}");
    assert!(html.contains("Enroll"), "missing enroll in {html}");
}

async fn submit_all(classroom: &Classroom, student_id: UserId, session: &Session) {
    let questions = classroom
        .storage
        .questions
        .list_questions(session.id())
        .await
        .expect("questions");
    let answers = questions
        .iter()
        .map(|q| {
            let answer = match q.kind() {
                QuestionKind::Rating { .. } => Answer::Rating(5),
                QuestionKind::MultipleChoice { options } => Answer::Choice(options[0].clone()),
                QuestionKind::Text => Answer::Text("more examples".into()),
            };
            (q.id(), answer)
        })
        .collect::<Vec<_>>();
    classroom
        .services
        .feedback()
        .submit(student_id, session.id(), answers)
        .await
        .expect("submit");
}

struct FailingSessions;

#[async_trait::async_trait]
impl SessionRepository for FailingSessions {
    async fn create_session(&self, _session: NewSessionRecord) -> Result<SessionId, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn get_session(&self, _id: SessionId) -> Result<Option<Session>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn list_sessions_for_teacher(
        &self,
        _teacher_id: UserId,
    ) -> Result<Vec<Session>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn find_sessions_by_code(&self, _code: &SessionCode) -> Result<Vec<Session>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn delete_session(&self, _id: SessionId) -> Result<(), StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn teacher_dashboard_smoke_renders_error_state() {
    let mut storage = Storage::in_memory();
    storage.sessions = Arc::new(FailingSessions);
    let classroom = Classroom::with_storage(storage);
    classroom
        .register("grace@school.edu", "Grace", Role::Teacher)
        .await;
    classroom.sign_in("grace@school.edu").await;

    let mut harness = classroom.mount(ViewKind::TeacherDashboard);
    let html = harness.settle().await;
    assert!(html.contains("Something went wrong"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}
