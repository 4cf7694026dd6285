use std::sync::Arc;

use feedback_core::model::{EnrolledTeacher, EnrollmentId, Role, User, UserId};
use storage::repository::{EnrollmentRepository, StorageError, UserRepository};

use crate::Clock;
use crate::error::EnrollmentError;

/// Links students with the teachers whose sessions they follow.
#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            enrollments,
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::NotFound` for unknown teachers,
    /// `EnrollmentError::NotATeacher` if the target is a student and
    /// `EnrollmentError::AlreadyEnrolled` for repeated enrollment.
    pub async fn enroll(
        &self,
        student_id: UserId,
        teacher_id: UserId,
    ) -> Result<EnrollmentId, EnrollmentError> {
        let teacher = self
            .users
            .get_user(teacher_id)
            .await?
            .ok_or(EnrollmentError::NotFound)?;
        if !teacher.is_teacher() {
            return Err(EnrollmentError::NotATeacher);
        }

        let id = self
            .enrollments
            .insert_enrollment(student_id, teacher_id, self.clock.now())
            .await
            .map_err(|e| match e {
                StorageError::Conflict => EnrollmentError::AlreadyEnrolled,
                other => EnrollmentError::Storage(other),
            })?;
        tracing::info!(
            student_id = student_id.value(),
            teacher_id = teacher_id.value(),
            "enrolled"
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::Storage` if the query fails.
    pub async fn enrolled_teachers(
        &self,
        student_id: UserId,
    ) -> Result<Vec<EnrolledTeacher>, EnrollmentError> {
        Ok(self.enrollments.list_enrolled_teachers(student_id).await?)
    }

    /// Teachers the student has not enrolled with yet, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::Storage` if a query fails.
    pub async fn available_teachers(
        &self,
        student_id: UserId,
    ) -> Result<Vec<User>, EnrollmentError> {
        let enrolled = self.enrollments.list_enrolled_teachers(student_id).await?;
        let teachers = self.users.list_users_by_role(Role::Teacher).await?;
        Ok(teachers
            .into_iter()
            .filter(|t| !enrolled.iter().any(|e| e.teacher.id() == t.id()))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::NotFound` for unknown enrollments and
    /// `EnrollmentError::NotOwner` if it belongs to another student.
    pub async fn unenroll(
        &self,
        student_id: UserId,
        enrollment_id: EnrollmentId,
    ) -> Result<(), EnrollmentError> {
        let enrollment = self
            .enrollments
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(EnrollmentError::NotFound)?;
        if enrollment.student_id != student_id {
            return Err(EnrollmentError::NotOwner);
        }
        self.enrollments.delete_enrollment(enrollment_id).await?;
        tracing::info!(
            student_id = student_id.value(),
            teacher_id = enrollment.teacher_id.value(),
            "unenrolled"
        );
        Ok(())
    }
}
