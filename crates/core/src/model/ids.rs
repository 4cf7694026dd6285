use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier shared by an account and its profile row.
    UserId
);
define_id!(
    /// Identifier of a feedback session.
    SessionId
);
define_id!(
    /// Identifier of a question within a session.
    QuestionId
);
define_id!(
    /// Identifier of a single stored answer.
    ResponseId
);
define_id!(
    /// Identifier of a student/teacher enrollment row.
    EnrollmentId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", SessionId::new(7)), "SessionId(7)");
        assert_eq!(format!("{:?}", UserId::new(3)), "UserId(3)");
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(QuestionId::new(42).to_string(), "42");
    }

    #[test]
    fn parse_accepts_surrounding_whitespace() {
        let id: ResponseId = " 12 ".parse().unwrap();
        assert_eq!(id, ResponseId::new(12));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "abc".parse::<EnrollmentId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse EnrollmentId from string");
    }
}
