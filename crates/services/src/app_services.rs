use std::sync::Arc;

use storage::objects::{AvatarStore, InMemoryAvatarStore};
use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::enrollment_service::EnrollmentService;
use crate::error::AppServicesError;
use crate::feedback_service::FeedbackService;
use crate::mailer::{LogMailer, Mailer};
use crate::profile_service::ProfileService;
use crate::results_service::ResultsService;
use crate::session_service::SessionService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    auth: Arc<AuthService>,
    profiles: Arc<ProfileService>,
    sessions: Arc<SessionService>,
    feedback: Arc<FeedbackService>,
    results: Arc<ResultsService>,
    enrollments: Arc<EnrollmentService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        max_connections: u32,
        avatars: Arc<dyn AvatarStore>,
        mailer: Arc<dyn Mailer>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite_with(db_url, max_connections).await?;
        tracing::info!(db_url, "storage ready");
        Ok(Self::from_storage(&storage, avatars, mailer, clock))
    }

    /// In-memory backend with an in-memory avatar store and a logging mailer.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(
            &Storage::in_memory(),
            Arc::new(InMemoryAvatarStore::new("mem://avatars")),
            Arc::new(LogMailer),
            clock,
        )
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        avatars: Arc<dyn AvatarStore>,
        mailer: Arc<dyn Mailer>,
        clock: Clock,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            clock,
            Arc::clone(&storage.accounts),
            Arc::clone(&storage.users),
            mailer,
        ));
        let profiles = Arc::new(ProfileService::new(
            Arc::clone(&storage.accounts),
            Arc::clone(&storage.users),
            avatars,
        ));
        let sessions = Arc::new(SessionService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.assignments),
            Arc::clone(&storage.responses),
        ));
        let feedback = Arc::new(FeedbackService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.responses),
        ));
        let results = Arc::new(ResultsService::new(
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.responses),
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.enrollments),
        ));

        Self {
            clock,
            auth,
            profiles,
            sessions,
            feedback,
            results,
            enrollments,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn feedback(&self) -> Arc<FeedbackService> {
        Arc::clone(&self.feedback)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }
}
