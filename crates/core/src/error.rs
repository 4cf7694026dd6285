use thiserror::Error;

use crate::model::{AnswerError, AssignmentError, QuestionError, SessionError, UserError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    User(#[from] UserError),
}
