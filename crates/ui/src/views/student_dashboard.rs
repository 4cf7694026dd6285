use std::time::Duration;

use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};
use feedback_core::model::{Role, SessionCode};
use services::SessionServiceError;

use crate::context::{AppContext, use_current_user};
use crate::routes::Route;
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::{StudentSessionCardVm, map_student_sessions};

/// How often the open-session list is reloaded, so sessions drop off once they
/// expire.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[component]
pub fn StudentDashboardView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let student_id = use_current_user()
        .filter(|u| u.role() == Role::Student)
        .map(|u| u.id());
    let sessions = ctx.sessions();
    let clock = ctx.clock();
    let mut code = use_signal(String::new);
    let mut join_error = use_signal(|| None::<String>);
    let mut joining = use_signal(|| false);

    let mut resource = use_resource(move || {
        let sessions = sessions.clone();
        async move {
            let student_id = student_id.ok_or(ViewError::Unauthorized)?;
            // Expired and already answered sessions are left out.
            let active = sessions
                .active_sessions(student_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(map_student_sessions(&active, clock.now()))
        }
    });

    // Dropped with the view's scope.
    use_future(move || async move {
        loop {
            tokio::time::sleep(REFRESH_INTERVAL).await;
            resource.restart();
        }
    });

    let on_join = {
        let sessions = ctx.sessions();
        use_callback(move |()| {
            let Some(student_id) = student_id else {
                return;
            };
            let entered = code().trim().to_string();
            if SessionCode::new(&entered).is_err() {
                join_error.set(Some("Codes are 6 digits.".to_string()));
                return;
            }
            let sessions = sessions.clone();
            spawn(async move {
                joining.set(true);
                match sessions.join_by_code(student_id, &entered).await {
                    Ok(session) => {
                        join_error.set(None);
                        code.set(String::new());
                        navigator.push(Route::Feedback {
                            code: session.code().to_string(),
                        });
                    }
                    Err(err) => join_error.set(Some(join_error_message(&err))),
                }
                joining.set(false);
            });
        })
    };

    if student_id.is_none() {
        return rsx! { SignInPrompt { required: Some(Role::Student) } };
    }

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "Your sessions" }

            form {
                class: "join-form",
                onsubmit: move |evt| {
                    evt.prevent_default();
                    on_join.call(());
                },
                label { "Join with a code"
                    input {
                        r#type: "text",
                        inputmode: "numeric",
                        maxlength: "6",
                        placeholder: "123456",
                        value: "{code}",
                        oninput: move |evt| code.set(evt.value()),
                    }
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: joining(),
                    "Join"
                }
            }
            if let Some(message) = join_error() {
                p { class: "error", "{message}" }
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(cards) => rsx! {
                    if cards.is_empty() {
                        p { "No open sessions right now. Ask your teacher for a code." }
                    } else {
                        ul { class: "session-list",
                            for (id, card) in cards.iter().map(|c| (c.id, c.clone())) {
                                StudentSessionCard { key: "{id.value()}", card }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| resource.restart(),
                        "Retry"
                    }
                },
            }
        }
    }
}

#[component]
fn StudentSessionCard(card: StudentSessionCardVm) -> Element {
    rsx! {
        li { class: "session-card",
            h3 { "{card.title}" }
            if let Some(description) = card.description.as_ref() {
                p { "{description}" }
            }
            p { class: "session-meta",
                if let Some(due) = card.due_date.as_ref() {
                    "Due {due} "
                }
                if let Some(remaining) = card.time_remaining.as_ref() {
                    "{remaining}"
                }
            }
            Link {
                class: "btn btn-primary",
                to: Route::Feedback { code: card.code.clone() },
                "Give feedback"
            }
        }
    }
}

fn join_error_message(err: &SessionServiceError) -> String {
    match err {
        SessionServiceError::InvalidCode => "No session uses that code.".to_string(),
        SessionServiceError::Expired => "That session has closed.".to_string(),
        _ => "Couldn't join the session. Please try again.".to_string(),
    }
}
