use feedback_core::model::{Question, Session, SessionCode, SessionId, UserId};

use super::SqliteRepository;
use super::mapping::{
    db, encode_question_kind, id_to_i64, map_question_row, map_session_row, session_id_from_i64,
};
use crate::repository::{NewSessionRecord, QuestionRepository, SessionRepository, StorageError};

const SESSION_COLUMNS: &str = "id, teacher_id, title, description, code, due_date, \
     time_limit_minutes, created_at, expires_at, assigned_students_count";

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn create_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError> {
        let assigned = i64::from(record.assigned_count());
        let mut tx = self.pool.begin().await.map_err(db)?;

        let res = sqlx::query(
            r"
            INSERT INTO sessions (teacher_id, title, description, code, due_date,
                                  time_limit_minutes, created_at, expires_at, assigned_students_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(id_to_i64("teacher_id", record.teacher_id.value())?)
        .bind(record.title.as_str())
        .bind(record.description.as_deref())
        .bind(record.code.as_str())
        .bind(record.due_date)
        .bind(i64::from(record.time_limit.minutes()))
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(assigned)
        .execute(&mut *tx)
        .await
        .map_err(db)?;
        let session_id = res.last_insert_rowid();

        for (position, draft) in record.questions.iter().enumerate() {
            if draft.text.trim().is_empty() {
                return Err(StorageError::Serialization("question text cannot be empty".into()));
            }
            let (tag, options, scale) = encode_question_kind(&draft.kind)?;
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO questions (session_id, position, text, type, options, scale, is_default)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(session_id)
            .bind(position)
            .bind(draft.text.trim())
            .bind(tag)
            .bind(options)
            .bind(scale)
            .bind(i64::from(draft.is_default))
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        for student_id in &record.student_ids {
            sqlx::query(
                r"
                INSERT INTO session_students (session_id, student_id, status)
                VALUES (?1, ?2, 'pending')
                ON CONFLICT(session_id, student_id) DO NOTHING
                ",
            )
            .bind(session_id)
            .bind(id_to_i64("student_id", student_id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        session_id_from_i64(session_id)
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"))
            .bind(id_to_i64("session_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn list_sessions_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE teacher_id = ?1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(id_to_i64("teacher_id", teacher_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn find_sessions_by_code(&self, code: &SessionCode) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE code = ?1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let id = id_to_i64("session_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        for statement in [
            "DELETE FROM responses WHERE session_id = ?1",
            "DELETE FROM session_students WHERE session_id = ?1",
            "DELETE FROM questions WHERE session_id = ?1",
        ] {
            sqlx::query(statement)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
        }
        let res = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(db)
    }
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn list_questions(&self, session_id: SessionId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, session_id, text, type, options, scale, is_default
            FROM questions
            WHERE session_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(id_to_i64("session_id", session_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_question_row).collect()
    }
}
