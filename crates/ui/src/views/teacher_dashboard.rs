use dioxus::prelude::*;
use dioxus_router::Link;
use feedback_core::model::{Role, SessionId, User};

use crate::context::{AppContext, use_current_user};
use crate::routes::Route;
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::{TeacherDashboardVm, TeacherSessionCardVm, map_teacher_dashboard};

#[component]
pub fn TeacherDashboardView() -> Element {
    let ctx = use_context::<AppContext>();
    let teacher_id = use_current_user()
        .filter(User::is_teacher)
        .map(|u| u.id());
    let sessions = ctx.sessions();
    let clock = ctx.clock();
    let mut pending_delete = use_signal(|| None::<SessionId>);
    let mut delete_error = use_signal(|| None::<String>);

    let mut resource = use_resource(move || {
        let sessions = sessions.clone();
        async move {
            let teacher_id = teacher_id.ok_or(ViewError::Unauthorized)?;
            let dashboard = sessions
                .teacher_dashboard(teacher_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(map_teacher_dashboard(&dashboard, clock.now()))
        }
    });

    let on_confirm_delete = {
        let sessions = ctx.sessions();
        use_callback(move |session_id: SessionId| {
            let Some(teacher_id) = teacher_id else {
                return;
            };
            let sessions = sessions.clone();
            spawn(async move {
                match sessions.delete_session(teacher_id, session_id).await {
                    Ok(()) => {
                        delete_error.set(None);
                        resource.restart();
                    }
                    Err(err) => {
                        tracing::warn!(session_id = session_id.value(), error = %err, "delete failed");
                        delete_error.set(Some("Couldn't delete the session.".to_string()));
                    }
                }
                pending_delete.set(None);
            });
        })
    };

    if teacher_id.is_none() {
        return rsx! { SignInPrompt { required: Some(Role::Teacher) } };
    }

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            div { class: "page-header",
                h2 { "Your sessions" }
                Link { class: "btn btn-primary", to: Route::CreateSession {}, "New session" }
            }

            if let Some(message) = delete_error() {
                p { class: "error", "{message}" }
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    DashboardStatsRow { data: data.clone() }
                    if data.cards.is_empty() {
                        p { "No sessions yet. Create one to get a join code." }
                    } else {
                        ul { class: "session-list",
                            for (id, card) in data.cards.iter().map(|c| (c.id, c.clone())) {
                                SessionCard {
                                    key: "{id.value()}",
                                    card,
                                    pending_delete,
                                    on_confirm_delete,
                                }
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
fn DashboardStatsRow(data: TeacherDashboardVm) -> Element {
    rsx! {
        dl { class: "stats",
            dt { "Sessions" }
            dd { "{data.total_sessions}" }
            dt { "Active" }
            dd { "{data.active_count}" }
            dt { "Completed" }
            dd { "{data.completed_count}" }
            dt { "Response rate" }
            dd { "{data.overall_response_rate}" }
        }
    }
}

#[component]
fn SessionCard(
    card: TeacherSessionCardVm,
    mut pending_delete: Signal<Option<SessionId>>,
    on_confirm_delete: Callback<SessionId>,
) -> Element {
    let id = card.id;
    let confirming = pending_delete() == Some(id);
    let status = if card.is_active {
        card.time_remaining.clone().unwrap_or_else(|| "Active".to_string())
    } else {
        "Completed".to_string()
    };

    rsx! {
        li { class: if card.is_active { "session-card session-card--active" } else { "session-card" },
            div { class: "session-card-head",
                h3 { "{card.title}" }
                span { class: "session-code", "Code {card.code}" }
            }
            p { class: "session-meta",
                "Created {card.created_at}"
                if let Some(due) = card.due_date.as_ref() {
                    " · Due {due}"
                }
            }
            p { class: "session-status", "{status}" }
            p { "Responses: {card.respondents} / {card.assigned} ({card.response_percent}%)" }
            div { class: "session-actions",
                Link { to: Route::Results { session_id: id.value() }, "View results" }
                if confirming {
                    span { "Delete this session and all its responses?" }
                    button {
                        class: "btn btn-danger",
                        r#type: "button",
                        onclick: move |_| on_confirm_delete.call(id),
                        "Delete"
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| pending_delete.set(None),
                        "Cancel"
                    }
                } else {
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| pending_delete.set(Some(id)),
                        "Delete"
                    }
                }
            }
        }
    }
}
