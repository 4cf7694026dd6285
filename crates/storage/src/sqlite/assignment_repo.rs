use feedback_core::model::{AssignedSession, Assignment, AssignmentStatus, SessionId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_session_row, ser};
use crate::repository::{AssignmentRepository, StorageError};

#[async_trait::async_trait]
impl AssignmentRepository for SqliteRepository {
    async fn ensure_assignment(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO session_students (session_id, student_id, status)
            VALUES (?1, ?2, 'pending')
            ON CONFLICT(session_id, student_id) DO NOTHING
            ",
        )
        .bind(id_to_i64("session_id", session_id.value())?)
        .bind(id_to_i64("student_id", student_id.value())?)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // Unknown session trips the foreign key.
            sqlx::Error::Database(ref inner) if inner.is_foreign_key_violation() => {
                StorageError::NotFound
            }
            other => db(other),
        })?;

        Ok(res.rows_affected() > 0)
    }

    async fn get_assignment(
        &self,
        session_id: SessionId,
        student_id: UserId,
    ) -> Result<Option<Assignment>, StorageError> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM session_students WHERE session_id = ?1 AND student_id = ?2",
        )
        .bind(id_to_i64("session_id", session_id.value())?)
        .bind(id_to_i64("student_id", student_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        status
            .map(|s| -> Result<Assignment, StorageError> {
                Ok(Assignment {
                    session_id,
                    student_id,
                    status: AssignmentStatus::parse(&s).map_err(ser)?,
                })
            })
            .transpose()
    }

    async fn list_assigned_sessions(
        &self,
        student_id: UserId,
    ) -> Result<Vec<AssignedSession>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT s.id, s.teacher_id, s.title, s.description, s.code, s.due_date,
                   s.time_limit_minutes, s.created_at, s.expires_at, s.assigned_students_count,
                   ss.status AS assignment_status
            FROM session_students ss
            JOIN sessions s ON s.id = ss.session_id
            WHERE ss.student_id = ?1
            ORDER BY s.created_at DESC, s.id DESC
            ",
        )
        .bind(id_to_i64("student_id", student_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter()
            .map(|row| -> Result<AssignedSession, StorageError> {
                let status: String = row.try_get("assignment_status").map_err(ser)?;
                Ok(AssignedSession {
                    session: map_session_row(row)?,
                    status: AssignmentStatus::parse(&status).map_err(ser)?,
                })
            })
            .collect()
    }
}
