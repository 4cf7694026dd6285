use chrono::{DateTime, Utc};

use crate::model::ids::{EnrollmentId, UserId};
use crate::model::user::User;

/// A student following a teacher. Unique per (student, teacher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub teacher_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Row of the "my teachers" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledTeacher {
    pub enrollment_id: EnrollmentId,
    pub teacher: User,
    pub session_count: u32,
    pub student_count: u32,
    pub enrolled_at: DateTime<Utc>,
}
