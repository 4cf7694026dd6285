use chrono::Duration;
use feedback_core::model::{
    AssignmentStatus, Email, QuestionDraft, QuestionKind, RatingScale, Role, SessionCode,
    TimeLimit, User, UserId,
};
use feedback_core::time::fixed_now;
use storage::repository::{
    AccountRepository, AssignmentRepository, EnrollmentRepository, NewAccountRecord,
    NewResponseRecord, NewSessionRecord, PasswordResetRecord, QuestionRepository,
    ResponseRepository, SessionRepository, StorageError, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn account(repo: &SqliteRepository, email: &str, role: Role) -> UserId {
    let id = repo
        .insert_account(NewAccountRecord {
            email: Email::new(email).unwrap(),
            password_hash: "hash".into(),
            name: email.split('@').next().unwrap().to_string(),
            role,
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let record = repo.get_account(id).await.unwrap().unwrap();
    repo.ensure_user(&record.to_profile()).await.unwrap();
    id
}

fn session_record(teacher: UserId, code: &str, students: Vec<UserId>) -> NewSessionRecord {
    let now = fixed_now();
    let limit = TimeLimit::from_minutes(45).unwrap();
    NewSessionRecord {
        teacher_id: teacher,
        title: "Ownership".into(),
        description: Some("Borrowing basics".into()),
        code: SessionCode::new(code).unwrap(),
        due_date: Some(now.date_naive()),
        time_limit: limit,
        created_at: now,
        expires_at: now + limit.duration(),
        questions: vec![
            QuestionDraft::custom("Clarity?", QuestionKind::rating()),
            QuestionDraft::custom(
                "Depth?",
                QuestionKind::Rating {
                    scale: RatingScale::Ten,
                },
            ),
            QuestionDraft::custom(
                "Best part?",
                QuestionKind::MultipleChoice {
                    options: vec!["Slides".into(), "Demo".into()],
                },
            ),
            QuestionDraft::custom("Comments", QuestionKind::Text),
        ],
        student_ids: students,
    }
}

#[tokio::test]
async fn sqlite_session_roundtrip_keeps_questions_in_order() {
    let repo = connect("memdb_session_roundtrip").await;
    let teacher = account(&repo, "t@school.edu", Role::Teacher).await;
    let student = account(&repo, "s@school.edu", Role::Student).await;

    let id = repo
        .create_session(session_record(teacher, "482913", vec![student]))
        .await
        .unwrap();

    let session = repo.get_session(id).await.unwrap().expect("session");
    assert_eq!(session.title(), "Ownership");
    assert_eq!(session.code().as_str(), "482913");
    assert_eq!(session.time_limit().map(TimeLimit::minutes), Some(45));
    assert_eq!(session.expires_at(), Some(fixed_now() + Duration::minutes(45)));
    assert_eq!(session.due_date(), Some(fixed_now().date_naive()));
    assert_eq!(session.assigned_students_count(), 1);

    let questions = repo.list_questions(id).await.unwrap();
    let texts: Vec<&str> = questions.iter().map(|q| q.text()).collect();
    assert_eq!(texts, vec!["Clarity?", "Depth?", "Best part?", "Comments"]);
    assert_eq!(
        questions[1].kind(),
        &QuestionKind::Rating {
            scale: RatingScale::Ten
        }
    );
    assert_eq!(
        questions[2].kind(),
        &QuestionKind::MultipleChoice {
            options: vec!["Slides".into(), "Demo".into()]
        }
    );

    let by_code = repo
        .find_sessions_by_code(&SessionCode::new("482913").unwrap())
        .await
        .unwrap();
    assert_eq!(by_code.len(), 1);
    assert_eq!(repo.list_sessions_for_teacher(teacher).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_submission_is_single_pass_and_completes_assignment() {
    let repo = connect("memdb_submission").await;
    let teacher = account(&repo, "t@school.edu", Role::Teacher).await;
    let student = account(&repo, "s@school.edu", Role::Student).await;
    let id = repo
        .create_session(session_record(teacher, "111222", vec![student]))
        .await
        .unwrap();
    let questions = repo.list_questions(id).await.unwrap();
    let rows: Vec<NewResponseRecord> = questions
        .iter()
        .map(|q| NewResponseRecord {
            question_id: q.id(),
            answer: "4".into(),
            submitted_at: fixed_now(),
        })
        .collect();

    assert!(!repo.has_responded(id, student).await.unwrap());
    repo.submit_responses(id, student, rows.clone()).await.unwrap();
    assert!(repo.has_responded(id, student).await.unwrap());

    let assigned = repo.list_assigned_sessions(student).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].status, AssignmentStatus::Completed);

    let err = repo.submit_responses(id, student, rows).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert_eq!(repo.list_responses(id).await.unwrap().len(), questions.len());
    assert_eq!(
        repo.list_response_pairs_for_teacher(teacher).await.unwrap(),
        vec![(id, student)]
    );
}

#[tokio::test]
async fn sqlite_delete_session_cascades() {
    let repo = connect("memdb_delete_cascade").await;
    let teacher = account(&repo, "t@school.edu", Role::Teacher).await;
    let student = account(&repo, "s@school.edu", Role::Student).await;
    let id = repo
        .create_session(session_record(teacher, "333444", vec![student]))
        .await
        .unwrap();
    let q = repo.list_questions(id).await.unwrap()[0].id();
    repo.submit_responses(
        id,
        student,
        vec![NewResponseRecord {
            question_id: q,
            answer: "5".into(),
            submitted_at: fixed_now(),
        }],
    )
    .await
    .unwrap();

    repo.delete_session(id).await.unwrap();

    assert!(repo.get_session(id).await.unwrap().is_none());
    assert!(repo.list_questions(id).await.unwrap().is_empty());
    assert!(repo.list_responses(id).await.unwrap().is_empty());
    assert!(repo.get_assignment(id, student).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_join_assignment_is_idempotent() {
    let repo = connect("memdb_join").await;
    let teacher = account(&repo, "t@school.edu", Role::Teacher).await;
    let student = account(&repo, "s@school.edu", Role::Student).await;
    let id = repo
        .create_session(session_record(teacher, "555666", vec![]))
        .await
        .unwrap();

    assert!(repo.ensure_assignment(id, student).await.unwrap());
    assert!(!repo.ensure_assignment(id, student).await.unwrap());
    let assignment = repo.get_assignment(id, student).await.unwrap().unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Pending);
}

#[tokio::test]
async fn sqlite_accounts_enforce_unique_email_and_cascade_delete() {
    let repo = connect("memdb_accounts").await;
    let teacher = account(&repo, "teach@school.edu", Role::Teacher).await;
    let student = account(&repo, "learn@school.edu", Role::Student).await;

    let dup = repo
        .insert_account(NewAccountRecord {
            email: Email::new("TEACH@school.edu").unwrap(),
            password_hash: "x".into(),
            name: "Dup".into(),
            role: Role::Teacher,
            created_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(dup, StorageError::Conflict));

    repo.insert_enrollment(student, teacher, fixed_now())
        .await
        .unwrap();
    let teachers = repo.list_enrolled_teachers(student).await.unwrap();
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].teacher.id(), teacher);
    assert_eq!(teachers[0].student_count, 1);
    assert_eq!(teachers[0].session_count, 0);

    repo.delete_account(student).await.unwrap();
    assert!(repo.get_user(student).await.unwrap().is_none());
    assert!(repo.get_account(student).await.unwrap().is_none());
    assert!(repo.list_enrolled_teachers(student).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_profile_upsert_keeps_existing_row() {
    let repo = connect("memdb_profiles").await;
    let id = account(&repo, "ada@school.edu", Role::Teacher).await;

    let mut profile = repo.get_user(id).await.unwrap().unwrap();
    profile.rename("Ada L.");
    let profile = profile.with_avatar_url(Some("file://avatars/1.png".into()));
    repo.update_user(&profile).await.unwrap();

    let again = User::new(
        id,
        "Someone else",
        Email::new("ada@school.edu").unwrap(),
        Role::Teacher,
        fixed_now(),
    );
    let stored = repo.ensure_user(&again).await.unwrap();
    assert_eq!(stored.name(), "Ada L.");
    assert_eq!(stored.avatar_url(), Some("file://avatars/1.png"));

    let teachers = repo.list_users_by_role(Role::Teacher).await.unwrap();
    assert_eq!(teachers.len(), 1);
    assert!(repo.list_users_by_role(Role::Student).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_reset_token_expires_and_is_single_use() {
    let repo = connect("memdb_resets").await;
    let id = account(&repo, "ada@school.edu", Role::Teacher).await;
    repo.insert_password_reset(PasswordResetRecord {
        token: "fresh".into(),
        account_id: id,
        expires_at: fixed_now() + Duration::hours(1),
        consumed: false,
    })
    .await
    .unwrap();

    let late = fixed_now() + Duration::hours(2);
    assert_eq!(repo.consume_password_reset("fresh", late).await.unwrap(), None);
    assert_eq!(
        repo.consume_password_reset("fresh", fixed_now()).await.unwrap(),
        Some(id)
    );
    assert_eq!(repo.consume_password_reset("fresh", fixed_now()).await.unwrap(), None);
}
