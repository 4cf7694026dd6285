use std::sync::Arc;
use std::time::Duration;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use feedback_core::model::{Role, Session, User, UserId};
use feedback_core::time::fixed_clock;
use services::{AppServices, Clock, RecordingMailer, SessionDraft};
use storage::objects::InMemoryAvatarStore;
use storage::repository::Storage;

use crate::context::{UiApp, build_app_context, use_auth_provider};
use crate::views::{
    FeedbackView, HomeView, ProfileView, ResultsView, StudentDashboardView,
    TeacherDashboardView, TeachersView,
};

pub const PASSWORD: &str = "secret1";

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    TeacherDashboard,
    Results(u64),
    StudentDashboard,
    Feedback(String),
    Profile,
    Teachers,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view.clone());
    use_auth_provider();
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::TeacherDashboard => rsx! { TeacherDashboardView {} },
        ViewKind::Results(session_id) => rsx! { ResultsView { session_id } },
        ViewKind::StudentDashboard => rsx! { StudentDashboardView {} },
        ViewKind::Feedback(code) => rsx! { FeedbackView { code } },
        ViewKind::Profile => rsx! { ProfileView {} },
        ViewKind::Teachers => rsx! { TeachersView {} },
    }
}

/// Services over fresh in-memory storage, with nobody signed in.
pub struct Classroom {
    pub storage: Storage,
    pub services: Arc<AppServices>,
}

impl Classroom {
    pub fn new() -> Self {
        Self::with_storage(Storage::in_memory())
    }

    pub fn with_storage(storage: Storage) -> Self {
        let services = services_over(&storage, fixed_clock());
        Self {
            storage,
            services: Arc::new(services),
        }
    }

    /// A second set of services over the same storage, reading time from `clock`.
    pub fn services_at(&self, clock: Clock) -> AppServices {
        services_over(&self.storage, clock)
    }

    /// Registers an account and returns its profile. Leaves nobody signed in.
    pub async fn register(&self, email: &str, name: &str, role: Role) -> User {
        let auth = self.services.auth();
        auth.sign_up(email, PASSWORD, name, role)
            .await
            .expect("sign up");
        let session = auth.sign_in(email, PASSWORD).await.expect("sign in");
        auth.sign_out();
        session.user
    }

    pub async fn sign_in(&self, email: &str) {
        self.services
            .auth()
            .sign_in(email, PASSWORD)
            .await
            .expect("sign in");
    }

    pub async fn create_session(&self, teacher: &User, title: &str, students: &[UserId]) -> Session {
        let mut draft = SessionDraft::new(title);
        draft.student_ids = students.to_vec();
        self.services
            .sessions()
            .create_session(teacher, draft)
            .await
            .expect("create session")
    }

    pub fn mount(&self, view: ViewKind) -> ViewHarness {
        let dom = VirtualDom::new_with_props(
            ViewRouterHarness,
            ViewHarnessProps {
                app: Arc::clone(&self.services),
                view,
            },
        );
        ViewHarness { dom }
    }
}

fn services_over(storage: &Storage, clock: Clock) -> AppServices {
    AppServices::from_storage(
        storage,
        Arc::new(InMemoryAvatarStore::new("mem://avatars")),
        Arc::new(RecordingMailer::new()),
        clock,
    )
}

pub struct ViewHarness {
    pub dom: VirtualDom,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(Duration::from_millis(50), self.dom.wait_for_work()).await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuilds and lets resources resolve before rendering.
    pub async fn settle(&mut self) -> String {
        self.rebuild();
        for _ in 0..3 {
            self.drive_async().await;
        }
        self.render()
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}
