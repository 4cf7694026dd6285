use dioxus::prelude::*;
use dioxus_router::Link;
use feedback_core::model::Role;

use crate::routes::Route;

/// Shown in place of a page the current user may not open.
#[component]
pub fn SignInPrompt(required: Option<Role>) -> Element {
    let message = match required {
        Some(Role::Teacher) => "This page is for teachers. Sign in with a teacher account.",
        Some(Role::Student) => "This page is for students. Sign in with a student account.",
        None => "Please sign in to continue.",
    };
    rsx! {
        div { class: "page",
            p { "{message}" }
            Link { to: Route::Auth {}, "Sign in" }
        }
    }
}
