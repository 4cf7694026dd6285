use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::model::ids::{SessionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session title cannot be empty")]
    EmptyTitle,

    #[error("session code must be exactly 6 digits: {0:?}")]
    InvalidCode(String),

    #[error("time limit must be between 1 and 1440 minutes, got {0}")]
    InvalidTimeLimit(u32),

    #[error("expires_at is before created_at")]
    InvalidTimeRange,
}

//
// ─── SESSION CODE ──────────────────────────────────────────────────────────────
//

/// Six-digit join code handed out to students.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionCode(String);

impl SessionCode {
    pub const LEN: usize = 6;
    pub const MIN: u32 = 100_000;
    pub const MAX: u32 = 999_999;

    /// Validates a code typed by a user or read from storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidCode` unless the value is exactly six ASCII digits.
    pub fn new(value: impl AsRef<str>) -> Result<Self, SessionError> {
        let raw = value.as_ref();
        if raw.len() == Self::LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SessionError::InvalidCode(raw.to_string()))
        }
    }

    /// Builds a code from a generated number in `100000..=999999`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidCode` for numbers outside that range.
    pub fn from_number(value: u32) -> Result<Self, SessionError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SessionError::InvalidCode(value.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── TIME LIMIT ────────────────────────────────────────────────────────────────
//

/// How long a session accepts answers after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeLimit(u32);

impl TimeLimit {
    pub const MIN_MINUTES: u32 = 1;
    pub const MAX_MINUTES: u32 = 1440;
    pub const PRESETS: [u32; 8] = [15, 30, 45, 60, 90, 120, 180, 240];

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTimeLimit` outside `1..=1440` minutes.
    pub fn from_minutes(minutes: u32) -> Result<Self, SessionError> {
        if (Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(SessionError::InvalidTimeLimit(minutes))
        }
    }

    #[must_use]
    pub fn minutes(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }

    #[must_use]
    pub fn is_preset(self) -> bool {
        Self::PRESETS.contains(&self.0)
    }

    /// Short label such as `45m` or `1h 30m`.
    #[must_use]
    pub fn label(self) -> String {
        let hours = self.0 / 60;
        let minutes = self.0 % 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        Self(30)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A feedback collection window owned by a teacher.
///
/// `expires_at` is fixed when the session is created and never recomputed.
/// Rows persisted without an expiry never expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    teacher_id: UserId,
    title: String,
    description: Option<String>,
    code: SessionCode,
    due_date: Option<NaiveDate>,
    time_limit: Option<TimeLimit>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    assigned_students_count: u32,
}

impl Session {
    /// Creates a session whose expiry is `created_at + time_limit`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTitle` if the trimmed title is empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        teacher_id: UserId,
        title: impl Into<String>,
        description: Option<String>,
        code: SessionCode,
        due_date: Option<NaiveDate>,
        time_limit: TimeLimit,
        created_at: DateTime<Utc>,
        assigned_students_count: u32,
    ) -> Result<Self, SessionError> {
        Self::from_persisted(
            id,
            teacher_id,
            title,
            description,
            code,
            due_date,
            Some(time_limit),
            created_at,
            Some(created_at + time_limit.duration()),
            assigned_students_count,
        )
    }

    /// Rehydrate a session from storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTitle` for blank titles and
    /// `SessionError::InvalidTimeRange` if the expiry precedes creation.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        teacher_id: UserId,
        title: impl Into<String>,
        description: Option<String>,
        code: SessionCode,
        due_date: Option<NaiveDate>,
        time_limit: Option<TimeLimit>,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        assigned_students_count: u32,
    ) -> Result<Self, SessionError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        if expires_at.is_some_and(|at| at < created_at) {
            return Err(SessionError::InvalidTimeRange);
        }
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            teacher_id,
            title,
            description,
            code,
            due_date,
            time_limit,
            created_at,
            expires_at,
            assigned_students_count,
        })
    }

    /// Returns a copy carrying the identifier assigned by storage.
    #[must_use]
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn teacher_id(&self) -> UserId {
        self.teacher_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    #[must_use]
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<TimeLimit> {
        self.time_limit
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[must_use]
    pub fn assigned_students_count(&self) -> u32 {
        self.assigned_students_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn code() -> SessionCode {
        SessionCode::new("123456").unwrap()
    }

    #[test]
    fn code_requires_six_digits() {
        assert!(SessionCode::new("123456").is_ok());
        for raw in ["12345", "1234567", "12a456", " 12345", ""] {
            assert!(SessionCode::new(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn code_from_number_enforces_range() {
        assert_eq!(SessionCode::from_number(100_000).unwrap().as_str(), "100000");
        assert!(SessionCode::from_number(99_999).is_err());
        assert!(SessionCode::from_number(1_000_000).is_err());
    }

    #[test]
    fn time_limit_bounds_and_label() {
        assert!(TimeLimit::from_minutes(0).is_err());
        assert!(TimeLimit::from_minutes(1441).is_err());
        assert_eq!(TimeLimit::from_minutes(90).unwrap().label(), "1h 30m");
        assert_eq!(TimeLimit::from_minutes(45).unwrap().label(), "45m");
        assert_eq!(TimeLimit::default().minutes(), 30);
    }

    #[test]
    fn new_session_sets_expiry_from_time_limit() {
        let now = fixed_now();
        let session = Session::new(
            SessionId::new(1),
            UserId::new(9),
            "  Hooks intro ",
            Some("   ".into()),
            code(),
            None,
            TimeLimit::from_minutes(45).unwrap(),
            now,
            3,
        )
        .unwrap();

        assert_eq!(session.title(), "Hooks intro");
        assert_eq!(session.description(), None);
        assert_eq!(session.expires_at(), Some(now + Duration::minutes(45)));
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Session::new(
            SessionId::new(1),
            UserId::new(9),
            " ",
            None,
            code(),
            None,
            TimeLimit::default(),
            fixed_now(),
            0,
        )
        .unwrap_err();
        assert_eq!(err, SessionError::EmptyTitle);
    }

    #[test]
    fn persisted_expiry_before_creation_is_rejected() {
        let now = fixed_now();
        let err = Session::from_persisted(
            SessionId::new(1),
            UserId::new(9),
            "Title",
            None,
            code(),
            None,
            None,
            now,
            Some(now - Duration::seconds(1)),
            0,
        )
        .unwrap_err();
        assert_eq!(err, SessionError::InvalidTimeRange);
    }
}
