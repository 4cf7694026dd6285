use thiserror::Error;

use crate::model::ids::{SessionId, UserId};
use crate::model::session::Session;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssignmentError {
    #[error("unknown assignment status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Completed,
}

impl AssignmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Completed => "completed",
        }
    }

    /// # Errors
    ///
    /// Returns `AssignmentError::UnknownStatus` for unrecognised tags.
    pub fn parse(value: &str) -> Result<Self, AssignmentError> {
        match value {
            "pending" => Ok(AssignmentStatus::Pending),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(AssignmentError::UnknownStatus(other.to_string())),
        }
    }
}

/// A student was offered a session. Unique per (session, student).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub session_id: SessionId,
    pub student_id: UserId,
    pub status: AssignmentStatus,
}

impl Assignment {
    #[must_use]
    pub fn pending(session_id: SessionId, student_id: UserId) -> Self {
        Self {
            session_id,
            student_id,
            status: AssignmentStatus::Pending,
        }
    }
}

/// A session as seen from a student's dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedSession {
    pub session: Session,
    pub status: AssignmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tags_round_trip() {
        for status in [AssignmentStatus::Pending, AssignmentStatus::Completed] {
            assert_eq!(AssignmentStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(AssignmentStatus::parse("done").is_err());
    }
}
