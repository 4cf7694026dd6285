use dioxus::prelude::*;
use dioxus_router::Link;
use feedback_core::model::{Answer, Question, QuestionKind, Role, SessionId, UserId};
use services::{FeedbackError, FeedbackForm};

use crate::context::{AppContext, use_current_user};
use crate::routes::Route;
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::{FeedbackFormVm, MALFORMED_QUESTION_WARNING, rating_choices};

#[derive(Clone, Debug, PartialEq, Eq)]
enum FormData {
    Expired,
    AlreadySubmitted,
    Ready {
        session_id: SessionId,
        title: String,
        description: Option<String>,
        questions: Vec<Question>,
    },
}

#[component]
pub fn FeedbackView(code: String) -> Element {
    let ctx = use_context::<AppContext>();
    let student_id = use_current_user()
        .filter(|u| u.role() == Role::Student)
        .map(|u| u.id());
    let feedback = ctx.feedback();

    let mut resource = use_resource(move || {
        let feedback = feedback.clone();
        let code = code.clone();
        async move {
            let student_id = student_id.ok_or(ViewError::Unauthorized)?;
            let form = feedback
                .open_form(student_id, &code)
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(match form {
                FeedbackForm::Expired => FormData::Expired,
                FeedbackForm::AlreadySubmitted => FormData::AlreadySubmitted,
                FeedbackForm::Ready { session, questions } => FormData::Ready {
                    session_id: session.id(),
                    title: session.title().to_string(),
                    description: session.description().map(str::to_string),
                    questions,
                },
            })
        }
    });

    let Some(student_id) = student_id else {
        return rsx! { SignInPrompt { required: Some(Role::Student) } };
    };

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page feedback",
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(FormData::Expired) => rsx! {
                    h2 { "Session closed" }
                    p { "This session has expired or the code is not valid." }
                    Link { to: Route::StudentDashboard {}, "Back to dashboard" }
                },
                ViewState::Ready(FormData::AlreadySubmitted) => rsx! {
                    h2 { "Already submitted" }
                    p { "You have already given feedback for this session. Thank you!" }
                    Link { to: Route::StudentDashboard {}, "Back to dashboard" }
                },
                ViewState::Ready(FormData::Ready { session_id, title, description, questions }) => rsx! {
                    h2 { "{title}" }
                    if let Some(description) = description {
                        p { class: "session-description", "{description}" }
                    }
                    FeedbackFormPanel { student_id, session_id, questions }
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
fn FeedbackFormPanel(student_id: UserId, session_id: SessionId, questions: Vec<Question>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut vm = use_signal(move || FeedbackFormVm::new(questions));
    let mut submitted = use_signal(|| false);
    let mut submitting = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);

    let on_submit = use_callback(move |()| {
        let (complete, answers) = {
            let form = vm.read();
            (form.is_complete(), form.answers())
        };
        if !complete {
            error.set(Some("Please answer every question first.".to_string()));
            return;
        }
        let feedback = ctx.feedback();
        spawn(async move {
            submitting.set(true);
            match feedback.submit(student_id, session_id, answers).await {
                Ok(()) => {
                    error.set(None);
                    submitted.set(true);
                }
                Err(err) => error.set(Some(submit_error_message(&err))),
            }
            submitting.set(false);
        });
    });

    if submitted() {
        return rsx! {
            div { class: "thank-you",
                h3 { "Thank you!" }
                p { "Your feedback has been recorded." }
                Link { to: Route::StudentDashboard {}, "Back to dashboard" }
            }
        };
    }

    let form = vm();
    let total = form.questions().len();
    let Some(question) = form.current_question().cloned() else {
        return rsx! { p { "This session has no questions." } };
    };
    let position = form.current_index() + 1;
    let progress = form.progress_percent();
    let answered = form.answered_count();
    let can_go_next = form.can_go_next();
    let is_first = form.is_first();
    let is_last = form.is_last();
    let is_complete = form.is_complete();
    let selected = form.answer(question.id()).cloned();

    rsx! {
        div { class: "feedback-form",
            div { class: "progress",
                span { "Question {position} of {total}" }
                span { class: "progress-track",
                    span { class: "progress-fill", style: "width: {progress}%" }
                }
                span { "{answered}/{total} answered" }
            }

            QuestionInput { key: "{question.id().value()}", question: question.clone(), selected, vm }

            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }

            div { class: "button-row",
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    disabled: is_first,
                    onclick: move |_| vm.write().previous(),
                    "Previous"
                }
                if is_last {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: !is_complete || submitting(),
                        onclick: move |_| on_submit.call(()),
                        if submitting() { "Submitting..." } else { "Submit feedback" }
                    }
                } else {
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: !can_go_next,
                        onclick: move |_| vm.write().next(),
                        "Next"
                    }
                }
            }
        }
    }
}

#[component]
fn QuestionInput(question: Question, selected: Option<Answer>, mut vm: Signal<FeedbackFormVm>) -> Element {
    let id = question.id();
    rsx! {
        div { class: "question",
            h3 { "{question.text()}" }
            match question.kind().clone() {
                QuestionKind::Rating { .. } => rsx! {
                    div { class: "rating-buttons",
                        for value in rating_choices(&question) {
                            button {
                                class: if selected == Some(Answer::Rating(value)) { "rating rating--selected" } else { "rating" },
                                r#type: "button",
                                onclick: move |_| vm.write().set_answer(id, Answer::Rating(value)),
                                "{value}"
                            }
                        }
                    }
                },
                QuestionKind::MultipleChoice { options } if options.is_empty() => rsx! {
                    p { class: "warning", "{MALFORMED_QUESTION_WARNING}" }
                },
                QuestionKind::MultipleChoice { options } => rsx! {
                    div { class: "choices",
                        for option in options {
                            label { class: "radio",
                                input {
                                    r#type: "radio",
                                    name: "choice-{id.value()}",
                                    checked: selected == Some(Answer::Choice(option.clone())),
                                    onchange: {
                                        let option = option.clone();
                                        move |_| vm.write().set_answer(id, Answer::Choice(option.clone()))
                                    },
                                }
                                "{option}"
                            }
                        }
                    }
                },
                QuestionKind::Text => {
                    let text = match &selected {
                        Some(Answer::Text(text)) => text.clone(),
                        _ => String::new(),
                    };
                    rsx! {
                        textarea {
                            value: "{text}",
                            placeholder: "Your answer",
                            oninput: move |evt| vm.write().set_answer(id, Answer::Text(evt.value())),
                        }
                    }
                }
            }
        }
    }
}

fn submit_error_message(err: &FeedbackError) -> String {
    match err {
        FeedbackError::Expired => "This session has closed. Your answers were not saved.".to_string(),
        FeedbackError::AlreadySubmitted => "You have already submitted feedback for this session.".to_string(),
        FeedbackError::Incomplete { .. } => "Please answer every question first.".to_string(),
        FeedbackError::Answer(inner) => format!("{inner}."),
        _ => "Couldn't submit your feedback. Please try again.".to_string(),
    }
}
