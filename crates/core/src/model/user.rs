use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("unknown role: {0}")]
    InvalidRole(String),
}

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Parses the stored role tag.
    ///
    /// # Errors
    ///
    /// Returns `UserError::InvalidRole` for anything other than `teacher` or `student`.
    pub fn parse(value: &str) -> Result<Self, UserError> {
        match value {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(UserError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── EMAIL ─────────────────────────────────────────────────────────────────────
//

/// Normalised (trimmed, lowercased) e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// # Errors
    ///
    /// Returns `UserError::InvalidEmail` unless the value has a non-empty local
    /// part and a dotted domain.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserError> {
        let normalized = value.as_ref().trim().to_lowercase();
        let valid = match normalized.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !normalized.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(UserError::InvalidEmail(value.as_ref().to_string()));
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// Profile row for a teacher or student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    email: Email,
    role: Role,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: Email,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            email,
            role,
            avatar_url: None,
            created_at,
        }
    }

    #[must_use]
    pub fn with_avatar_url(mut self, url: Option<String>) -> Self {
        self.avatar_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name for display; falls back to the e-mail's local part when unnamed.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email
                .as_str()
                .split('@')
                .next()
                .unwrap_or(self.email.as_str())
        } else {
            &self.name
        }
    }

    /// First letter of the display name, uppercased, for avatar placeholders.
    #[must_use]
    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map_or('?', |c| c.to_ascii_uppercase())
    }

    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into().trim().to_string();
    }

    pub fn set_email(&mut self, email: Email) {
        self.email = email;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn email_is_normalised() {
        let email = Email::new("  Ada@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
    }

    #[test]
    fn email_rejects_malformed_values() {
        for raw in ["", "ada", "@example.com", "ada@", "ada@example", "a@b@c.com", "a b@c.com"] {
            assert!(Email::new(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn role_round_trips_through_tag() {
        assert_eq!(Role::parse(Role::Teacher.as_str()).unwrap(), Role::Teacher);
        assert_eq!(
            Role::parse("admin").unwrap_err(),
            UserError::InvalidRole("admin".into())
        );
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = User::new(
            UserId::new(1),
            "   ",
            Email::new("sam@school.edu").unwrap(),
            Role::Student,
            fixed_now(),
        );
        assert_eq!(user.display_name(), "sam");
        assert_eq!(user.initial(), 'S');
    }
}
