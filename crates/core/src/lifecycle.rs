//! Expiry rules for sessions.
//!
//! Everything here is a pure function of a session's `expires_at` and the
//! caller's notion of "now", so views and services agree on what is open.

use chrono::{DateTime, Utc};

use crate::model::{AssignedSession, AssignmentStatus, Session};

/// True once `now` is strictly past the session's expiry.
///
/// Sessions without an expiry never expire, and a session whose expiry is
/// exactly `now` is still open.
#[must_use]
pub fn is_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at().is_some_and(|at| now > at)
}

/// Sessions a student can still answer: not expired and not yet completed.
///
/// Order is preserved and the input is left untouched.
#[must_use]
pub fn filter_active_sessions_for_students(
    sessions: &[AssignedSession],
    now: DateTime<Utc>,
) -> Vec<AssignedSession> {
    sessions
        .iter()
        .filter(|s| !is_expired(&s.session, now) && s.status != AssignmentStatus::Completed)
        .cloned()
        .collect()
}

/// Human readable time left, e.g. `2h 5m remaining`.
///
/// Returns `None` when the session has no expiry and `Expired` once no time is left.
#[must_use]
pub fn session_time_remaining(session: &Session, now: DateTime<Utc>) -> Option<String> {
    let expires_at = session.expires_at()?;
    let remaining = expires_at - now;
    if remaining <= chrono::Duration::zero() {
        return Some("Expired".to_string());
    }
    let minutes = remaining.num_minutes();
    let text = if minutes >= 60 {
        format!("{}h {}m remaining", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m remaining")
    };
    Some(text)
}

/// Whether `code` belongs to a session that is still open.
///
/// Only the first session carrying the code is considered.
#[must_use]
pub fn validate_session_code(code: &str, sessions: &[Session], now: DateTime<Utc>) -> bool {
    sessions
        .iter()
        .find(|s| s.code().as_str() == code)
        .is_some_and(|s| !is_expired(s, now))
}
