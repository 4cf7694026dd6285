#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod enrollment_service;
pub mod error;
pub mod feedback_service;
pub mod mailer;
pub mod password;
pub mod profile_service;
pub mod results_service;
pub mod session_service;

pub use feedback_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, AuthSession};
pub use enrollment_service::EnrollmentService;
pub use error::{
    AppServicesError, AuthError, EnrollmentError, FeedbackError, ProfileError, ResultsError,
    SessionServiceError,
};
pub use feedback_service::{FeedbackForm, FeedbackService};
pub use mailer::{LogMailer, Mailer, RecordingMailer, ResetMail};
pub use profile_service::ProfileService;
pub use results_service::{ResultsService, SessionReport};
pub use session_service::{SessionDraft, SessionService, TeacherDashboard};
