use dioxus::prelude::*;
use dioxus_router::Link;
use feedback_core::model::Role;

use crate::context::use_current_user;
use crate::routes::{Route, dashboard_route};

#[component]
pub fn HomeView() -> Element {
    let user = use_current_user();

    rsx! {
        div { class: "page",
            h2 { "Classroom Feedback" }
            match user {
                None => rsx! {
                    p { "Collect quick, anonymous-feeling feedback after every class." }
                    Link { class: "btn btn-primary", to: Route::Auth {}, "Sign in or create an account" }
                },
                Some(user) => {
                    let blurb = match user.role() {
                        Role::Teacher => "Create a session, share its code and watch the results come in.",
                        Role::Student => "Enter the code your teacher shares to give feedback.",
                    };
                    rsx! {
                        p { "Welcome back, {user.display_name()}." }
                        p { "{blurb}" }
                        Link { class: "btn btn-primary", to: dashboard_route(user.role()), "Go to dashboard" }
                    }
                }
            }
        }
    }
}
