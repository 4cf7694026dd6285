use dioxus::prelude::*;
use dioxus_router::Link;
use feedback_core::model::{Role, SessionId, User};
use services::ResultsError;

use crate::context::{AppContext, use_current_user};
use crate::routes::Route;
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::{BarVm, ChoiceCardVm, RatingCardVm, ResultsVm, TextCardVm, map_session_results};

#[component]
pub fn ResultsView(session_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let teacher_id = use_current_user()
        .filter(User::is_teacher)
        .map(|u| u.id());
    let results = ctx.results();
    let clock = ctx.clock();

    let mut resource = use_resource(move || {
        let results = results.clone();
        async move {
            let teacher_id = teacher_id.ok_or(ViewError::Unauthorized)?;
            let report = results
                .session_report(teacher_id, SessionId::new(session_id))
                .await
                .map_err(|err| match err {
                    ResultsError::NotFound | ResultsError::NotOwner => ViewError::NotFound,
                    _ => ViewError::Unknown,
                })?;
            Ok::<_, ViewError>(map_session_results(&report, clock.now()))
        }
    });

    if teacher_id.is_none() {
        return rsx! { SignInPrompt { required: Some(Role::Teacher) } };
    }

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page results",
            Link { to: Route::TeacherDashboard {}, "Back to dashboard" }
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(vm) => rsx! {
                    ResultsBody { vm }
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
fn ResultsBody(vm: ResultsVm) -> Element {
    rsx! {
        h2 { "{vm.title}" }
        p { class: "session-meta", "Code {vm.code} · Created {vm.created_at} · {vm.status}" }

        dl { class: "stats",
            dt { "Responses" }
            dd { "{vm.respondents}" }
            dt { "Response rate" }
            dd { "{vm.response_rate}" }
            dt { "Average rating" }
            dd { "{vm.overall_average}" }
            dt { "Satisfaction" }
            dd { "{vm.satisfaction_rate}" }
        }

        if !vm.has_responses {
            p { class: "hint", "No responses yet. Share the code with your students." }
        }

        if !vm.rating.is_empty() {
            section {
                h3 { "Ratings" }
                for (id, card) in vm.rating.iter().map(|c| (c.question_id, c.clone())) {
                    RatingCard { key: "{id.value()}", card }
                }
            }
        }

        if !vm.choice.is_empty() {
            section {
                h3 { "Multiple choice" }
                for (id, card) in vm.choice.iter().map(|c| (c.question_id, c.clone())) {
                    ChoiceCard { key: "{id.value()}", card }
                }
            }
        }

        if !vm.text.is_empty() {
            section {
                h3 { "Written answers" }
                for (id, card) in vm.text.iter().map(|c| (c.question_id, c.clone())) {
                    TextCard { key: "{id.value()}", card }
                }
            }
        }

        if !vm.timeline.is_empty() {
            section {
                h3 { "Submissions over time" }
                Bars { bars: vm.timeline.clone() }
            }
        }
    }
}

#[component]
fn RatingCard(card: RatingCardVm) -> Element {
    rsx! {
        div { class: "result-card",
            h4 { "{card.text}" }
            p { class: "result-average", "{card.average_label}" }
            Bars { bars: card.bars }
        }
    }
}

#[component]
fn ChoiceCard(card: ChoiceCardVm) -> Element {
    rsx! {
        div { class: "result-card",
            h4 { "{card.text}" }
            p { class: "hint", "{card.total} answers" }
            Bars { bars: card.bars }
        }
    }
}

#[component]
fn TextCard(card: TextCardVm) -> Element {
    rsx! {
        div { class: "result-card",
            h4 { "{card.text}" }
            if card.answers.is_empty() {
                p { class: "hint", "No answers yet." }
            } else {
                ul { class: "text-answers",
                    for (answer, submitted_at) in card.answers {
                        li {
                            p { "{answer}" }
                            span { class: "hint", "{submitted_at}" }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn Bars(bars: Vec<BarVm>) -> Element {
    rsx! {
        ul { class: "bars",
            for bar in bars {
                li { class: "bar-row",
                    span { class: "bar-label", "{bar.label}" }
                    span { class: "bar-track",
                        span { class: "bar-fill", style: "width: {bar.width_percent}%" }
                    }
                    span { class: "bar-count", "{bar.count}" }
                }
            }
        }
    }
}
