use dioxus::prelude::*;
use dioxus_router::use_navigator;
use feedback_core::model::{
    DEFAULT_QUESTIONS, DefaultQuestionSelection, QuestionType, RatingScale, Role, TimeLimit,
    User, UserId,
};
use services::SessionServiceError;

use crate::context::{AppContext, use_current_user};
use crate::routes::Route;
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::{CreateSessionFormVm, CustomQuestionVm, TimeLimitChoice};

const CUSTOM_TIME_VALUE: &str = "custom";

#[derive(Clone, Debug, PartialEq, Eq)]
struct StudentOption {
    id: UserId,
    label: String,
}

#[component]
pub fn CreateSessionView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let teacher = use_current_user().filter(User::is_teacher);
    let profiles = ctx.profiles();
    let mut form = use_signal(CreateSessionFormVm::default);
    let mut error = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);

    let students = use_resource(move || {
        let profiles = profiles.clone();
        async move {
            let students = profiles
                .list_students()
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(
                students
                    .iter()
                    .map(|s| StudentOption {
                        id: s.id(),
                        label: format!("{} ({})", s.display_name(), s.email()),
                    })
                    .collect::<Vec<_>>(),
            )
        }
    });

    let on_submit = {
        let teacher = teacher.clone();
        use_callback(move |()| {
            let Some(teacher) = teacher.clone() else {
                return;
            };
            let draft = match form.read().to_draft() {
                Ok(draft) => draft,
                Err(message) => {
                    error.set(Some(message));
                    return;
                }
            };
            let sessions = ctx.sessions();
            spawn(async move {
                saving.set(true);
                match sessions.create_session(&teacher, draft).await {
                    Ok(_) => {
                        error.set(None);
                        navigator.push(Route::TeacherDashboard {});
                    }
                    Err(err) => error.set(Some(create_error_message(&err))),
                }
                saving.set(false);
            });
        })
    };

    if teacher.is_none() {
        return rsx! { SignInPrompt { required: Some(Role::Teacher) } };
    }

    let current = form();
    let time_value = match current.time_limit {
        TimeLimitChoice::Preset(minutes) => minutes.to_string(),
        TimeLimitChoice::Custom => CUSTOM_TIME_VALUE.to_string(),
    };
    let question_count = current.question_count();

    rsx! {
        div { class: "page create-session",
            h2 { "New feedback session" }

            section { class: "form-section",
                label { "Title"
                    input {
                        r#type: "text",
                        value: "{current.title}",
                        oninput: move |evt| form.write().title = evt.value(),
                    }
                }
                label { "Description"
                    textarea {
                        value: "{current.description}",
                        oninput: move |evt| form.write().description = evt.value(),
                    }
                }
                label { "Due date"
                    input {
                        r#type: "date",
                        value: "{current.due_date}",
                        oninput: move |evt| form.write().due_date = evt.value(),
                    }
                }
                label { "Time limit"
                    select {
                        value: "{time_value}",
                        onchange: move |evt| {
                            let value = evt.value();
                            form.write().time_limit = value
                                .parse::<u32>()
                                .map_or(TimeLimitChoice::Custom, TimeLimitChoice::Preset);
                        },
                        for minutes in TimeLimit::PRESETS {
                            option { value: "{minutes}", "{preset_label(minutes)}" }
                        }
                        option { value: CUSTOM_TIME_VALUE, "Custom..." }
                    }
                }
                if current.time_limit == TimeLimitChoice::Custom {
                    label { "Minutes ({TimeLimit::MIN_MINUTES}-{TimeLimit::MAX_MINUTES})"
                        input {
                            r#type: "number",
                            min: "{TimeLimit::MIN_MINUTES}",
                            max: "{TimeLimit::MAX_MINUTES}",
                            value: "{current.custom_minutes}",
                            oninput: move |evt| form.write().custom_minutes = evt.value(),
                        }
                    }
                }
            }

            section { class: "form-section",
                h3 { "Default questions" }
                for (index, text) in DEFAULT_QUESTIONS.iter().enumerate() {
                    label { class: "checkbox",
                        input {
                            r#type: "checkbox",
                            checked: current.defaults.is_enabled(index),
                            disabled: DefaultQuestionSelection::is_locked(index),
                            onchange: move |evt| form.write().defaults.set(index, evt.checked()),
                        }
                        "{text}"
                        if DefaultQuestionSelection::is_locked(index) {
                            span { class: "hint", " (always included)" }
                        }
                    }
                }
            }

            section { class: "form-section",
                h3 { "Custom questions" }
                for (index, question) in current.custom_questions.iter().cloned().enumerate() {
                    CustomQuestionEditor { key: "{index}", index, question, form }
                }
                div { class: "button-row",
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| form.write().add_question(QuestionType::Rating),
                        "+ Rating"
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| form.write().add_question(QuestionType::MultipleChoice),
                        "+ Multiple choice"
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| form.write().add_question(QuestionType::Text),
                        "+ Text"
                    }
                }
            }

            section { class: "form-section",
                h3 { "Students" }
                match view_state_from_resource(&students) {
                    ViewState::Idle | ViewState::Loading => rsx! {
                        p { "Loading students..." }
                    },
                    ViewState::Ready(options) => rsx! {
                        if options.is_empty() {
                            p { "No students have signed up yet. Students can still join with the code." }
                        }
                        for student in options {
                            label { class: "checkbox",
                                input {
                                    r#type: "checkbox",
                                    checked: current.is_selected(student.id),
                                    onchange: move |_| form.write().toggle_student(student.id),
                                }
                                "{student.label}"
                            }
                        }
                    },
                    ViewState::Error(err) => rsx! {
                        p { class: "error", "{err.message()}" }
                    },
                }
            }

            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }

            div { class: "button-row",
                span { class: "hint", "{question_count} questions" }
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: saving(),
                    onclick: move |_| on_submit.call(()),
                    if saving() { "Creating..." } else { "Create session" }
                }
            }
        }
    }
}

#[component]
fn CustomQuestionEditor(
    index: usize,
    question: CustomQuestionVm,
    mut form: Signal<CreateSessionFormVm>,
) -> Element {
    let kind_label = match question.question_type {
        QuestionType::Rating => "Rating",
        QuestionType::MultipleChoice => "Multiple choice",
        QuestionType::Text => "Text",
    };
    let scale_value = question.scale.max().to_string();

    rsx! {
        div { class: "question-editor",
            div { class: "question-editor-head",
                span { class: "badge", "{kind_label}" }
                button {
                    class: "btn btn-link",
                    r#type: "button",
                    onclick: move |_| form.write().remove_question(index),
                    "Remove"
                }
            }
            input {
                r#type: "text",
                placeholder: "Question text",
                value: "{question.text}",
                oninput: move |evt| {
                    if let Some(q) = form.write().custom_questions.get_mut(index) {
                        q.text = evt.value();
                    }
                },
            }
            match question.question_type {
                QuestionType::Rating => rsx! {
                    select {
                        value: "{scale_value}",
                        onchange: move |evt| {
                            let scale = if evt.value() == "10" { RatingScale::Ten } else { RatingScale::Five };
                            if let Some(q) = form.write().custom_questions.get_mut(index) {
                                q.scale = scale;
                            }
                        },
                        option { value: "5", "1 to 5" }
                        option { value: "10", "1 to 10" }
                    }
                },
                QuestionType::MultipleChoice => rsx! {
                    ul { class: "option-list",
                        for (option_index, option) in question.options.iter().cloned().enumerate() {
                            li { key: "{option_index}",
                                input {
                                    r#type: "text",
                                    placeholder: "Option {option_index + 1}",
                                    value: "{option}",
                                    oninput: move |evt| {
                                        if let Some(slot) = form
                                            .write()
                                            .custom_questions
                                            .get_mut(index)
                                            .and_then(|q| q.options.get_mut(option_index))
                                        {
                                            *slot = evt.value();
                                        }
                                    },
                                }
                                button {
                                    class: "btn btn-link",
                                    r#type: "button",
                                    onclick: move |_| form.write().remove_option(index, option_index),
                                    "Remove"
                                }
                            }
                        }
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| form.write().add_option(index),
                        "+ Option"
                    }
                },
                QuestionType::Text => rsx! {},
            }
        }
    }
}

fn preset_label(minutes: u32) -> String {
    TimeLimit::from_minutes(minutes).map_or_else(|_| format!("{minutes} min"), TimeLimit::label)
}

fn create_error_message(err: &SessionServiceError) -> String {
    match err {
        SessionServiceError::NotTeacher => "Only teachers can create sessions.".to_string(),
        SessionServiceError::Question(inner) => format!("Check your questions: {inner}."),
        SessionServiceError::Session(inner) => format!("Check the session details: {inner}."),
        SessionServiceError::CodeSpaceExhausted { .. } => {
            "Couldn't find a free join code. Please try again.".to_string()
        }
        _ => "Couldn't create the session. Please try again.".to_string(),
    }
}
