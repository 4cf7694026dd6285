mod assignment;
mod enrollment;
mod ids;
mod question;
mod response;
mod session;
mod user;

pub use ids::{EnrollmentId, ParseIdError, QuestionId, ResponseId, SessionId, UserId};

pub use assignment::{AssignedSession, Assignment, AssignmentError, AssignmentStatus};
pub use enrollment::{EnrolledTeacher, Enrollment};
pub use question::{
    DEFAULT_QUESTIONS, DefaultQuestionSelection, Question, QuestionDraft, QuestionError,
    QuestionKind, QuestionType, RatingScale, SATISFACTION_QUESTION_INDEX,
};
pub use response::{Answer, AnswerError, Response};
pub use session::{Session, SessionCode, SessionError, TimeLimit};
pub use user::{Email, Role, User, UserError};
