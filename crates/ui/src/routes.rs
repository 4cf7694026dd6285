use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable, use_navigator};
use feedback_core::model::Role;

use crate::context::{AppContext, use_current_user};
use crate::views::{
    AuthView, CreateSessionView, FeedbackView, HomeView, ProfileView, ResetPasswordView,
    ResultsView, StudentDashboardView, TeacherDashboardView, TeachersView,
};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/auth", AuthView)] Auth {},
        #[route("/reset-password/:token", ResetPasswordView)] ResetPassword { token: String },
        #[route("/teacher", TeacherDashboardView)] TeacherDashboard {},
        #[route("/teacher/sessions/new", CreateSessionView)] CreateSession {},
        #[route("/teacher/sessions/:session_id/results", ResultsView)] Results { session_id: u64 },
        #[route("/student", StudentDashboardView)] StudentDashboard {},
        #[route("/feedback/:code", FeedbackView)] Feedback { code: String },
        #[route("/profile", ProfileView)] Profile {},
        #[route("/teachers", TeachersView)] Teachers {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let user = use_current_user();

    rsx! {
        nav { class: "sidebar",
            h1 { "Feedback" }
            match user {
                None => rsx! {
                    ul {
                        li { Link { to: Route::Auth {}, "Sign in" } }
                    }
                },
                Some(user) => rsx! {
                    p { class: "sidebar-user", "{user.display_name()}" }
                    ul {
                        if user.role() == Role::Teacher {
                            li { Link { to: Route::TeacherDashboard {}, "Dashboard" } }
                            li { Link { to: Route::CreateSession {}, "New session" } }
                        } else {
                            li { Link { to: Route::StudentDashboard {}, "Dashboard" } }
                            li { Link { to: Route::Teachers {}, "Teachers" } }
                        }
                        li { Link { to: Route::Profile {}, "Profile" } }
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| {
                            ctx.auth().sign_out();
                            navigator.push(Route::Auth {});
                        },
                        "Sign out"
                    }
                },
            }
        }
    }
}

/// Where a signed-in user lands.
#[must_use]
pub fn dashboard_route(role: Role) -> Route {
    match role {
        Role::Teacher => Route::TeacherDashboard {},
        Role::Student => Route::StudentDashboard {},
    }
}
