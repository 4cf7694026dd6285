mod auth_vm;
mod dashboard_vm;
mod feedback_vm;
mod results_vm;
mod session_form_vm;
mod time_fmt;

pub use auth_vm::{AuthFormVm, AuthMode, auth_error_message};
pub use dashboard_vm::{
    StudentSessionCardVm, TeacherDashboardVm, TeacherSessionCardVm,
    map_student_session, map_student_sessions, map_teacher_dashboard,
};
pub use feedback_vm::{FeedbackFormVm, MALFORMED_QUESTION_WARNING, rating_choices};
pub use results_vm::{
    BarVm, ChoiceCardVm, RatingCardVm, ResultsVm, TextCardVm, map_session_results,
};
pub use session_form_vm::{CreateSessionFormVm, CustomQuestionVm, TimeLimitChoice};
pub use time_fmt::{format_date, format_datetime, format_percent, percent_of};
