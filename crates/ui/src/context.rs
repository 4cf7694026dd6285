use std::sync::Arc;

use dioxus::prelude::*;
use feedback_core::model::User;
use services::{
    AppServices, AuthService, AuthSession, Clock, EnrollmentService, FeedbackService,
    ProfileService, ResultsService, SessionService,
};

/// Everything the views need from the composition root.
pub trait UiApp: Send + Sync {
    fn clock(&self) -> Clock;

    fn auth(&self) -> Arc<AuthService>;
    fn profiles(&self) -> Arc<ProfileService>;
    fn sessions(&self) -> Arc<SessionService>;
    fn feedback(&self) -> Arc<FeedbackService>;
    fn results(&self) -> Arc<ResultsService>;
    fn enrollments(&self) -> Arc<EnrollmentService>;
}

impl UiApp for AppServices {
    fn clock(&self) -> Clock {
        AppServices::clock(self)
    }

    fn auth(&self) -> Arc<AuthService> {
        AppServices::auth(self)
    }

    fn profiles(&self) -> Arc<ProfileService> {
        AppServices::profiles(self)
    }

    fn sessions(&self) -> Arc<SessionService> {
        AppServices::sessions(self)
    }

    fn feedback(&self) -> Arc<FeedbackService> {
        AppServices::feedback(self)
    }

    fn results(&self) -> Arc<ResultsService> {
        AppServices::results(self)
    }

    fn enrollments(&self) -> Arc<EnrollmentService> {
        AppServices::enrollments(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    clock: Clock,
    auth: Arc<AuthService>,
    profiles: Arc<ProfileService>,
    sessions: Arc<SessionService>,
    feedback: Arc<FeedbackService>,
    results: Arc<ResultsService>,
    enrollments: Arc<EnrollmentService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            clock: app.clock(),
            auth: app.auth(),
            profiles: app.profiles(),
            sessions: app.sessions(),
            feedback: app.feedback(),
            results: app.results(),
            enrollments: app.enrollments(),
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

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

//
// ─── AUTH STATE ────────────────────────────────────────────────────────────────
//

/// The signed-in user as a reactive signal, mirrored from `AuthService`.
#[derive(Clone, Copy)]
pub struct AuthState(pub Signal<Option<AuthSession>>);

/// Provide [`AuthState`] and keep it in sync with the auth service.
///
/// Must be called below the component that provides [`AppContext`].
pub fn use_auth_provider() -> AuthState {
    let ctx = use_context::<AppContext>();
    let auth = ctx.auth();
    let initial = auth.current_session();
    let state = use_context_provider(|| AuthState(Signal::new(initial)));

    use_future(move || {
        let auth = Arc::clone(&auth);
        let mut signal = state.0;
        async move {
            let mut changes = auth.subscribe();
            while changes.changed().await.is_ok() {
                let next = changes.borrow_and_update().clone();
                tracing::debug!(signed_in = next.is_some(), "auth state changed");
                signal.set(next);
            }
        }
    });

    state
}

/// The current user, if anyone is signed in.
#[must_use]
pub fn use_current_user() -> Option<User> {
    let state = use_context::<AuthState>();
    let session = state.0.read();
    session.as_ref().map(|s| s.user.clone())
}
