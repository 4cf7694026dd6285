use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuestionId, ResponseId, SessionId, UserId};
use crate::model::question::{Question, QuestionKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("answer does not match the question type")]
    KindMismatch,

    #[error("rating {value} is outside 1..={max}")]
    RatingOutOfRange { value: u8, max: u8 },

    #[error("{0:?} is not one of the options")]
    UnknownOption(String),

    #[error("answer is empty")]
    Empty,
}

/// A student's answer to one question, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Rating(u8),
    Choice(String),
    Text(String),
}

impl Answer {
    /// Text written to the `answer` column; ratings become decimal strings.
    #[must_use]
    pub fn to_stored(&self) -> String {
        match self {
            Answer::Rating(value) => value.to_string(),
            Answer::Choice(option) => option.clone(),
            Answer::Text(text) => text.trim().to_string(),
        }
    }

    /// Checks the answer against the question it is meant for.
    ///
    /// # Errors
    ///
    /// Returns an `AnswerError` when the kind differs, a rating falls outside
    /// the scale, a choice is not listed, or a text answer is blank.
    pub fn validate_for(&self, question: &Question) -> Result<(), AnswerError> {
        match (self, question.kind()) {
            (Answer::Rating(value), QuestionKind::Rating { scale }) => {
                if (1..=scale.max()).contains(value) {
                    Ok(())
                } else {
                    Err(AnswerError::RatingOutOfRange {
                        value: *value,
                        max: scale.max(),
                    })
                }
            }
            (Answer::Choice(option), QuestionKind::MultipleChoice { options }) => {
                if options.iter().any(|o| o == option) {
                    Ok(())
                } else {
                    Err(AnswerError::UnknownOption(option.clone()))
                }
            }
            (Answer::Text(text), QuestionKind::Text) => {
                if text.trim().is_empty() {
                    Err(AnswerError::Empty)
                } else {
                    Ok(())
                }
            }
            _ => Err(AnswerError::KindMismatch),
        }
    }
}

/// One stored answer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: ResponseId,
    pub session_id: SessionId,
    pub student_id: UserId,
    pub question_id: QuestionId,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}
