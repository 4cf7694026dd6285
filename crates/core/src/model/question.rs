use thiserror::Error;

use crate::model::ids::{QuestionId, SessionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("multiple-choice question {0:?} has no options")]
    MissingOptions(String),

    #[error("rating scale must be 5 or 10, got {0}")]
    InvalidScale(u32),

    #[error("unknown question type: {0}")]
    UnknownType(String),
}

//
// ─── KINDS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RatingScale {
    #[default]
    Five,
    Ten,
}

impl RatingScale {
    /// Highest accepted rating; the lowest is always 1.
    #[must_use]
    pub fn max(self) -> u8 {
        match self {
            RatingScale::Five => 5,
            RatingScale::Ten => 10,
        }
    }

    /// # Errors
    ///
    /// Returns `QuestionError::InvalidScale` for anything but 5 or 10.
    pub fn from_max(max: u32) -> Result<Self, QuestionError> {
        match max {
            5 => Ok(RatingScale::Five),
            10 => Ok(RatingScale::Ten),
            other => Err(QuestionError::InvalidScale(other)),
        }
    }
}

/// Storage tag of a question kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    Text,
    Rating,
    MultipleChoice,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Rating => "rating",
            QuestionType::MultipleChoice => "multiple-choice",
        }
    }

    /// # Errors
    ///
    /// Returns `QuestionError::UnknownType` for unrecognised tags.
    pub fn parse(value: &str) -> Result<Self, QuestionError> {
        match value {
            "text" => Ok(QuestionType::Text),
            "rating" => Ok(QuestionType::Rating),
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            other => Err(QuestionError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    Rating { scale: RatingScale },
    MultipleChoice { options: Vec<String> },
}

impl QuestionKind {
    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Text => QuestionType::Text,
            QuestionKind::Rating { .. } => QuestionType::Rating,
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
        }
    }

    #[must_use]
    pub fn rating() -> Self {
        QuestionKind::Rating {
            scale: RatingScale::Five,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question attached to a session. Immutable once the session exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    session_id: SessionId,
    text: String,
    kind: QuestionKind,
    is_default: bool,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the trimmed text is empty.
    pub fn new(
        id: QuestionId,
        session_id: SessionId,
        text: impl Into<String>,
        kind: QuestionKind,
        is_default: bool,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        Ok(Self {
            id,
            session_id,
            text,
            kind,
            is_default,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Multiple-choice rows that reached storage without options.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(&self.kind, QuestionKind::MultipleChoice { options } if options.is_empty())
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// A question as authored in the create-session form, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub kind: QuestionKind,
    pub is_default: bool,
}

impl QuestionDraft {
    #[must_use]
    pub fn custom(text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            text: text.into(),
            kind,
            is_default: false,
        }
    }

    /// Cleans up an authored question.
    ///
    /// Blank questions yield `Ok(None)` and are dropped by the caller.
    /// Multiple-choice options are trimmed and blank ones removed.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingOptions` when a multiple-choice question
    /// has no options left.
    pub fn normalize(self) -> Result<Option<Self>, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }
        let kind = match self.kind {
            QuestionKind::MultipleChoice { options } => {
                let options: Vec<String> = options
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if options.is_empty() {
                    return Err(QuestionError::MissingOptions(text));
                }
                QuestionKind::MultipleChoice { options }
            }
            other => other,
        };
        Ok(Some(Self {
            text,
            kind,
            is_default: self.is_default,
        }))
    }

    /// Attaches storage identifiers.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the text is blank.
    pub fn into_question(
        self,
        id: QuestionId,
        session_id: SessionId,
    ) -> Result<Question, QuestionError> {
        Question::new(id, session_id, self.text, self.kind, self.is_default)
    }
}

/// Built-in rating questions, in display order.
pub const DEFAULT_QUESTIONS: [&str; 5] = [
    "How clear was the session content?",
    "How would you rate the teaching pace?",
    "Was the session interactive enough?",
    "How well did the teacher explain complex concepts?",
    "Overall, how satisfied are you with this session?",
];

/// Index of the satisfaction question in [`DEFAULT_QUESTIONS`]. Always included.
pub const SATISFACTION_QUESTION_INDEX: usize = 4;

/// Which default questions a teacher kept switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultQuestionSelection {
    enabled: [bool; DEFAULT_QUESTIONS.len()],
}

impl Default for DefaultQuestionSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl DefaultQuestionSelection {
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: [true; DEFAULT_QUESTIONS.len()],
        }
    }

    /// Only the compulsory satisfaction question.
    #[must_use]
    pub fn none() -> Self {
        let mut enabled = [false; DEFAULT_QUESTIONS.len()];
        enabled[SATISFACTION_QUESTION_INDEX] = true;
        Self { enabled }
    }

    /// Toggles a default question. The satisfaction question cannot be turned off.
    pub fn set(&mut self, index: usize, on: bool) {
        if index == SATISFACTION_QUESTION_INDEX {
            return;
        }
        if let Some(slot) = self.enabled.get_mut(index) {
            *slot = on;
        }
    }

    #[must_use]
    pub fn is_enabled(&self, index: usize) -> bool {
        index == SATISFACTION_QUESTION_INDEX || self.enabled.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_locked(index: usize) -> bool {
        index == SATISFACTION_QUESTION_INDEX
    }

    /// Drafts for every enabled default question, satisfaction included.
    #[must_use]
    pub fn drafts(&self) -> Vec<QuestionDraft> {
        DEFAULT_QUESTIONS
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_enabled(*i))
            .map(|(_, text)| QuestionDraft {
                text: (*text).to_string(),
                kind: QuestionKind::rating(),
                is_default: true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfaction_survives_every_toggle() {
        let mut selection = DefaultQuestionSelection::all();
        for i in 0..DEFAULT_QUESTIONS.len() {
            selection.set(i, false);
        }
        let drafts = selection.drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, DEFAULT_QUESTIONS[SATISFACTION_QUESTION_INDEX]);
        assert!(drafts[0].is_default);
        assert_eq!(selection, DefaultQuestionSelection::none());
    }

    #[test]
    fn all_defaults_are_five_point_ratings() {
        let drafts = DefaultQuestionSelection::all().drafts();
        assert_eq!(drafts.len(), 5);
        assert!(drafts.iter().all(|d| d.kind == QuestionKind::rating()));
    }

    #[test]
    fn blank_custom_question_is_dropped() {
        let draft = QuestionDraft::custom("   ", QuestionKind::Text);
        assert_eq!(draft.normalize().unwrap(), None);
    }

    #[test]
    fn choice_options_are_trimmed() {
        let draft = QuestionDraft::custom(
            " Favourite topic? ",
            QuestionKind::MultipleChoice {
                options: vec![" Hooks ".into(), "".into(), "Effects".into()],
            },
        );
        let draft = draft.normalize().unwrap().unwrap();
        assert_eq!(draft.text, "Favourite topic?");
        assert_eq!(
            draft.kind,
            QuestionKind::MultipleChoice {
                options: vec!["Hooks".into(), "Effects".into()]
            }
        );
    }

    #[test]
    fn choice_without_options_is_rejected() {
        let draft = QuestionDraft::custom(
            "Pick one",
            QuestionKind::MultipleChoice {
                options: vec!["  ".into()],
            },
        );
        assert_eq!(
            draft.normalize().unwrap_err(),
            QuestionError::MissingOptions("Pick one".into())
        );
    }

    #[test]
    fn type_tags_round_trip() {
        for ty in [
            QuestionType::Text,
            QuestionType::Rating,
            QuestionType::MultipleChoice,
        ] {
            assert_eq!(QuestionType::parse(ty.as_str()).unwrap(), ty);
        }
        assert!(QuestionType::parse("essay").is_err());
    }

    #[test]
    fn scale_accepts_five_and_ten() {
        assert_eq!(RatingScale::from_max(10).unwrap().max(), 10);
        assert_eq!(RatingScale::from_max(7), Err(QuestionError::InvalidScale(7)));
    }

    #[test]
    fn malformed_choice_is_detected() {
        let q = Question::new(
            QuestionId::new(1),
            SessionId::new(1),
            "Pick",
            QuestionKind::MultipleChoice { options: vec![] },
            false,
        )
        .unwrap();
        assert!(q.is_malformed());
    }
}
