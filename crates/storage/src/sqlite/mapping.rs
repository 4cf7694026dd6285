use chrono::{DateTime, NaiveDate, Utc};
use feedback_core::model::{
    Email, EnrollmentId, Question, QuestionId, QuestionKind, QuestionType, RatingScale, Response,
    ResponseId, Role, Session, SessionCode, SessionId, TimeLimit, User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{AccountRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, turning unique-constraint violations into `Conflict`.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(inner) if inner.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn response_id_from_i64(v: i64) -> Result<ResponseId, StorageError> {
    Ok(ResponseId::new(i64_to_u64("response_id", v)?))
}

pub(crate) fn enrollment_id_from_i64(v: i64) -> Result<EnrollmentId, StorageError> {
    Ok(EnrollmentId::new(i64_to_u64("enrollment_id", v)?))
}

pub(crate) fn map_account_row(row: &SqliteRow) -> Result<AccountRecord, StorageError> {
    Ok(AccountRecord {
        id: user_id_from_i64(row.try_get("id").map_err(ser)?)?,
        email: Email::new(row.try_get::<String, _>("email").map_err(ser)?).map_err(ser)?,
        password_hash: row.try_get("password_hash").map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        role: Role::parse(&row.try_get::<String, _>("role").map_err(ser)?).map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let user = User::new(
        user_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        Email::new(row.try_get::<String, _>("email").map_err(ser)?).map_err(ser)?,
        Role::parse(&row.try_get::<String, _>("role").map_err(ser)?).map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    );
    Ok(user.with_avatar_url(row.try_get("avatar_url").map_err(ser)?))
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<Session, StorageError> {
    let time_limit = row
        .try_get::<Option<i64>, _>("time_limit_minutes")
        .map_err(ser)?
        .map(|m| i64_to_u32("time_limit_minutes", m))
        .transpose()?
        .map(TimeLimit::from_minutes)
        .transpose()
        .map_err(ser)?;
    let assigned: i64 = row.try_get("assigned_students_count").map_err(ser)?;
    let due_date: Option<NaiveDate> = row.try_get("due_date").map_err(ser)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(ser)?;

    Session::from_persisted(
        session_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("teacher_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        SessionCode::new(row.try_get::<String, _>("code").map_err(ser)?).map_err(ser)?,
        due_date,
        time_limit,
        row.try_get("created_at").map_err(ser)?,
        expires_at,
        i64_to_u32("assigned_students_count", assigned)?,
    )
    .map_err(ser)
}

/// Splits a question kind into its `type`, `options` (JSON) and `scale` columns.
pub(crate) fn encode_question_kind(
    kind: &QuestionKind,
) -> Result<(&'static str, Option<String>, Option<i64>), StorageError> {
    let tag = kind.question_type().as_str();
    match kind {
        QuestionKind::Text => Ok((tag, None, None)),
        QuestionKind::Rating { scale } => Ok((tag, None, Some(i64::from(scale.max())))),
        QuestionKind::MultipleChoice { options } => {
            let json = serde_json::to_string(options).map_err(ser)?;
            Ok((tag, Some(json), None))
        }
    }
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let tag: String = row.try_get("type").map_err(ser)?;
    let kind = match QuestionType::parse(&tag).map_err(ser)? {
        QuestionType::Text => QuestionKind::Text,
        QuestionType::Rating => {
            let scale = row
                .try_get::<Option<i64>, _>("scale")
                .map_err(ser)?
                .map(|s| i64_to_u32("scale", s).and_then(|s| RatingScale::from_max(s).map_err(ser)))
                .transpose()?
                .unwrap_or_default();
            QuestionKind::Rating { scale }
        }
        QuestionType::MultipleChoice => {
            // Missing or empty options are kept so the form can flag the question.
            let options = match row.try_get::<Option<String>, _>("options").map_err(ser)? {
                Some(json) => serde_json::from_str::<Vec<String>>(&json).map_err(ser)?,
                None => Vec::new(),
            };
            QuestionKind::MultipleChoice { options }
        }
    };
    let is_default: i64 = row.try_get("is_default").map_err(ser)?;

    Question::new(
        question_id_from_i64(row.try_get("id").map_err(ser)?)?,
        session_id_from_i64(row.try_get("session_id").map_err(ser)?)?,
        row.try_get::<String, _>("text").map_err(ser)?,
        kind,
        is_default != 0,
    )
    .map_err(ser)
}

pub(crate) fn map_response_row(row: &SqliteRow) -> Result<Response, StorageError> {
    Ok(Response {
        id: response_id_from_i64(row.try_get("id").map_err(ser)?)?,
        session_id: session_id_from_i64(row.try_get("session_id").map_err(ser)?)?,
        student_id: user_id_from_i64(row.try_get("student_id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get("question_id").map_err(ser)?)?,
        answer: row.try_get("answer").map_err(ser)?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
    })
}
