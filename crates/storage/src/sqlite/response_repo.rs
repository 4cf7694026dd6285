use feedback_core::model::{Response, SessionId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_response_row, ser, session_id_from_i64, user_id_from_i64};
use crate::repository::{NewResponseRecord, ResponseRepository, StorageError};

#[async_trait::async_trait]
impl ResponseRepository for SqliteRepository {
    async fn submit_responses(
        &self,
        session_id: SessionId,
        student_id: UserId,
        rows: Vec<NewResponseRecord>,
    ) -> Result<(), StorageError> {
        let session = id_to_i64("session_id", session_id.value())?;
        let student = id_to_i64("student_id", student_id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM sessions WHERE id = ?1")
            .bind(session)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let already: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM responses WHERE session_id = ?1 AND student_id = ?2 LIMIT 1",
        )
        .bind(session)
        .bind(student)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db)?;
        if already.is_some() {
            return Err(StorageError::Conflict);
        }

        for row in rows {
            sqlx::query(
                r"
                INSERT INTO responses (session_id, student_id, question_id, answer, submitted_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(session)
            .bind(student)
            .bind(id_to_i64("question_id", row.question_id.value())?)
            .bind(row.answer)
            .bind(row.submitted_at)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        sqlx::query(
            r"
            INSERT INTO session_students (session_id, student_id, status)
            VALUES (?1, ?2, 'completed')
            ON CONFLICT(session_id, student_id) DO UPDATE SET status = 'completed'
            ",
        )
        .bind(session)
        .bind(student)
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        tx.commit().await.map_err(db)
    }

    async fn list_responses(&self, session_id: SessionId) -> Result<Vec<Response>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, session_id, student_id, question_id, answer, submitted_at
            FROM responses
            WHERE session_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("session_id", session_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_response_row).collect()
    }

    async fn has_responded(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<bool, StorageError> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM responses WHERE session_id = ?1 AND student_id = ?2 LIMIT 1",
        )
        .bind(id_to_i64("session_id", session_id.value())?)
        .bind(id_to_i64("student_id", student_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;
        Ok(row.is_some())
    }

    async fn list_response_pairs_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<(SessionId, UserId)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT r.session_id, r.student_id
            FROM responses r
            JOIN sessions s ON s.id = r.session_id
            WHERE s.teacher_id = ?1
            ",
        )
        .bind(id_to_i64("teacher_id", teacher_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter()
            .map(|row| -> Result<(SessionId, UserId), StorageError> {
                Ok((
                    session_id_from_i64(row.try_get("session_id").map_err(ser)?)?,
                    user_id_from_i64(row.try_get("student_id").map_err(ser)?)?,
                ))
            })
            .collect()
    }
}
