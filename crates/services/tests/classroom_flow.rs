use std::sync::Arc;

use chrono::Duration;
use feedback_core::model::{Answer, QuestionKind, Role, TimeLimit, UserId};
use feedback_core::time::fixed_clock;
use services::{
    AppServices, FeedbackError, FeedbackForm, RecordingMailer, SessionDraft,
    SessionServiceError,
};
use storage::objects::InMemoryAvatarStore;
use storage::repository::Storage;

async fn sign_up_and_in(services: &AppServices, email: &str, role: Role) -> UserId {
    let auth = services.auth();
    auth.sign_up(email, "secret1", email, role).await.unwrap();
    let session = auth.sign_in(email, "secret1").await.unwrap();
    auth.sign_out();
    session.user.id()
}

async fn run_classroom(services: AppServices) {
    let teacher_id = sign_up_and_in(&services, "grace@school.edu", Role::Teacher).await;
    let student_id = sign_up_and_in(&services, "alan@school.edu", Role::Student).await;
    let late_id = sign_up_and_in(&services, "ada@school.edu", Role::Student).await;
    let teacher = services.profiles().get_profile(teacher_id).await.unwrap();

    let students = services.profiles().list_students().await.unwrap();
    assert_eq!(students.len(), 2);

    let mut draft = SessionDraft::new("Ownership");
    draft.time_limit = TimeLimit::from_minutes(45).unwrap();
    draft.student_ids = vec![student_id];
    let session = services
        .sessions()
        .create_session(&teacher, draft)
        .await
        .unwrap();

    let joined = services
        .sessions()
        .join_by_code(late_id, session.code().as_str())
        .await
        .unwrap();
    assert_eq!(joined.id(), session.id());

    let form = services
        .feedback()
        .open_form(student_id, session.code().as_str())
        .await
        .unwrap();
    let FeedbackForm::Ready { questions, .. } = form else {
        panic!("form should be open");
    };
    let answers = questions
        .iter()
        .map(|q| {
            let answer = match q.kind() {
                QuestionKind::Rating { .. } => Answer::Rating(5),
                QuestionKind::MultipleChoice { options } => Answer::Choice(options[0].clone()),
                QuestionKind::Text => Answer::Text("great".into()),
            };
            (q.id(), answer)
        })
        .collect::<Vec<_>>();
    services
        .feedback()
        .submit(student_id, session.id(), answers.clone())
        .await
        .unwrap();
    assert!(matches!(
        services
            .feedback()
            .submit(student_id, session.id(), answers)
            .await,
        Err(FeedbackError::AlreadySubmitted)
    ));

    let dashboard = services
        .sessions()
        .teacher_dashboard(teacher_id)
        .await
        .unwrap();
    let stats = dashboard.stats.for_session(session.id()).unwrap();
    assert_eq!(stats.respondents, 1);
    assert_eq!(stats.assigned, 1);
    assert_eq!(dashboard.stats.overall_response_rate, 100);

    let report = services
        .results()
        .session_report(teacher_id, session.id())
        .await
        .unwrap();
    assert_eq!(report.results.fully_responded, 1);
    assert!((report.results.satisfaction_rate - 100.0).abs() < f64::EPSILON);

    let active = services.sessions().active_sessions(late_id).await.unwrap();
    assert_eq!(active.len(), 1);
    let active = services.sessions().active_sessions(student_id).await.unwrap();
    assert!(active.is_empty());

    assert!(matches!(
        services
            .sessions()
            .delete_session(student_id, session.id())
            .await,
        Err(SessionServiceError::NotOwner)
    ));
    services
        .sessions()
        .delete_session(teacher_id, session.id())
        .await
        .unwrap();
    assert!(
        services
            .sessions()
            .assigned_sessions(late_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn classroom_flow_in_memory() {
    run_classroom(AppServices::in_memory(fixed_clock())).await;
}

#[tokio::test]
async fn classroom_flow_sqlite() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_services_flow?mode=memory&cache=shared",
        2,
        Arc::new(InMemoryAvatarStore::new("mem://avatars")),
        Arc::new(RecordingMailer::new()),
        fixed_clock(),
    )
    .await
    .unwrap();
    run_classroom(services).await;
}

#[tokio::test]
async fn codes_close_once_the_time_limit_passes() {
    let storage = Storage::in_memory();
    let at = |minutes: i64| {
        AppServices::from_storage(
            &storage,
            Arc::new(InMemoryAvatarStore::new("mem://avatars")),
            Arc::new(RecordingMailer::new()),
            fixed_clock().advanced(Duration::minutes(minutes)),
        )
    };
    let now = at(0);
    let teacher_id = sign_up_and_in(&now, "grace@school.edu", Role::Teacher).await;
    let teacher = now.profiles().get_profile(teacher_id).await.unwrap();
    let mut draft = SessionDraft::new("Quick check");
    draft.time_limit = TimeLimit::from_minutes(15).unwrap();
    let session = now.sessions().create_session(&teacher, draft).await.unwrap();
    let code = session.code().as_str().to_string();

    // Exactly at expiry the session is still open.
    let form = at(15).feedback().open_form(UserId::new(99), &code).await.unwrap();
    assert!(matches!(form, FeedbackForm::Ready { .. }));

    let late = at(16);
    assert_eq!(
        late.feedback().open_form(UserId::new(99), &code).await.unwrap(),
        FeedbackForm::Expired
    );
    assert!(matches!(
        late.sessions().join_by_code(UserId::new(99), &code).await,
        Err(SessionServiceError::Expired)
    ));
}
