use chrono::{DateTime, Utc};
use feedback_core::model::{EnrolledTeacher, Enrollment, EnrollmentId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    db, enrollment_id_from_i64, i64_to_u32, id_to_i64, map_user_row, ser, user_id_from_i64,
};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(
        &self,
        student_id: UserId,
        teacher_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<EnrollmentId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO student_teachers (student_id, teacher_id, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("student_id", student_id.value())?)
        .bind(id_to_i64("teacher_id", teacher_id.value())?)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        enrollment_id_from_i64(res.last_insert_rowid())
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            "SELECT id, student_id, teacher_id, created_at FROM student_teachers WHERE id = ?1",
        )
        .bind(id_to_i64("enrollment_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.map(|row| -> Result<Enrollment, StorageError> {
            Ok(Enrollment {
                id: enrollment_id_from_i64(row.try_get("id").map_err(ser)?)?,
                student_id: user_id_from_i64(row.try_get("student_id").map_err(ser)?)?,
                teacher_id: user_id_from_i64(row.try_get("teacher_id").map_err(ser)?)?,
                created_at: row.try_get("created_at").map_err(ser)?,
            })
        })
        .transpose()
    }

    async fn list_enrolled_teachers(
        &self,
        student_id: UserId,
    ) -> Result<Vec<EnrolledTeacher>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT st.id AS enrollment_id, st.created_at AS enrolled_at,
                   u.id, u.name, u.email, u.role, u.avatar_url, u.created_at,
                   (SELECT COUNT(*) FROM sessions s WHERE s.teacher_id = u.id) AS session_count,
                   (SELECT COUNT(*) FROM student_teachers o WHERE o.teacher_id = u.id) AS student_count
            FROM student_teachers st
            JOIN users u ON u.id = st.teacher_id
            WHERE st.student_id = ?1
            ORDER BY st.id ASC
            ",
        )
        .bind(id_to_i64("student_id", student_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter()
            .map(|row| -> Result<EnrolledTeacher, StorageError> {
                Ok(EnrolledTeacher {
                    enrollment_id: enrollment_id_from_i64(
                        row.try_get("enrollment_id").map_err(ser)?,
                    )?,
                    teacher: map_user_row(row)?,
                    session_count: i64_to_u32(
                        "session_count",
                        row.try_get("session_count").map_err(ser)?,
                    )?,
                    student_count: i64_to_u32(
                        "student_count",
                        row.try_get("student_count").map_err(ser)?,
                    )?,
                    enrolled_at: row.try_get("enrolled_at").map_err(ser)?,
                })
            })
            .collect()
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM student_teachers WHERE id = ?1")
            .bind(id_to_i64("enrollment_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
