mod auth;
mod create_session;
mod feedback;
mod guard;
mod home;
mod profile;
mod results;
mod state;
mod student_dashboard;
mod teacher_dashboard;
mod teachers;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use auth::{AuthView, ResetPasswordView};
pub use create_session::CreateSessionView;
pub use feedback::FeedbackView;
pub use guard::SignInPrompt;
pub use home::HomeView;
pub use profile::ProfileView;
pub use results::ResultsView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use student_dashboard::{REFRESH_INTERVAL, StudentDashboardView};
pub use teacher_dashboard::TeacherDashboardView;
pub use teachers::TeachersView;
