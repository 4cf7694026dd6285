use dioxus::prelude::*;
use feedback_core::model::{EnrolledTeacher, EnrollmentId, Role, User, UserId};
use services::EnrollmentError;

use crate::context::{AppContext, use_current_user};
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::format_date;

#[derive(Clone, Debug, PartialEq, Eq)]
struct TeachersData {
    enrolled: Vec<EnrolledTeacher>,
    available: Vec<User>,
}

#[component]
pub fn TeachersView() -> Element {
    let ctx = use_context::<AppContext>();
    let student_id = use_current_user()
        .filter(|u| u.role() == Role::Student)
        .map(|u| u.id());
    let enrollments = ctx.enrollments();
    let mut error = use_signal(|| None::<String>);

    let mut resource = use_resource(move || {
        let enrollments = enrollments.clone();
        async move {
            let student_id = student_id.ok_or(ViewError::Unauthorized)?;
            let enrolled = enrollments
                .enrolled_teachers(student_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            let available = enrollments
                .available_teachers(student_id)
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(TeachersData {
                enrolled,
                available,
            })
        }
    });

    let on_enroll = {
        let enrollments = ctx.enrollments();
        use_callback(move |teacher_id: UserId| {
            let Some(student_id) = student_id else {
                return;
            };
            let enrollments = enrollments.clone();
            spawn(async move {
                match enrollments.enroll(student_id, teacher_id).await {
                    Ok(_) => {
                        error.set(None);
                        resource.restart();
                    }
                    Err(err) => error.set(Some(enrollment_error_message(&err))),
                }
            });
        })
    };

    let on_unenroll = {
        let enrollments = ctx.enrollments();
        use_callback(move |enrollment_id: EnrollmentId| {
            let Some(student_id) = student_id else {
                return;
            };
            let enrollments = enrollments.clone();
            spawn(async move {
                match enrollments.unenroll(student_id, enrollment_id).await {
                    Ok(()) => {
                        error.set(None);
                        resource.restart();
                    }
                    Err(err) => error.set(Some(enrollment_error_message(&err))),
                }
            });
        })
    };

    if student_id.is_none() {
        return rsx! { SignInPrompt { required: Some(Role::Student) } };
    }

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page teachers",
            h2 { "Teachers" }
            if let Some(message) = error() {
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
                    section {
                        h3 { "My teachers" }
                        if data.enrolled.is_empty() {
                            p { "You have not enrolled with any teacher yet." }
                        } else {
                            ul { class: "teacher-list",
                                for (enrollment_id, entry) in data.enrolled.iter().map(|e| (e.enrollment_id, e.clone())) {
                                    li { key: "{enrollment_id.value()}",
                                        strong { "{entry.teacher.display_name()}" }
                                        span { class: "hint",
                                            " {entry.session_count} sessions · {entry.student_count} students · since {format_date(entry.enrolled_at.date_naive())}"
                                        }
                                        button {
                                            class: "btn btn-link",
                                            r#type: "button",
                                            onclick: move |_| on_unenroll.call(enrollment_id),
                                            "Leave"
                                        }
                                    }
                                }
                            }
                        }
                    }
                    section {
                        h3 { "Available teachers" }
                        if data.available.is_empty() {
                            p { "No other teachers to enroll with." }
                        } else {
                            ul { class: "teacher-list",
                                for (teacher_id, teacher) in data.available.iter().map(|t| (t.id(), t.clone())) {
                                    li { key: "{teacher_id.value()}",
                                        strong { "{teacher.display_name()}" }
                                        span { class: "hint", " {teacher.email()}" }
                                        button {
                                            class: "btn btn-secondary",
                                            r#type: "button",
                                            onclick: move |_| on_enroll.call(teacher_id),
                                            "Enroll"
                                        }
                                    }
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

fn enrollment_error_message(err: &EnrollmentError) -> String {
    match err {
        EnrollmentError::AlreadyEnrolled => "You are already enrolled with this teacher.".to_string(),
        EnrollmentError::NotATeacher => "That user is not a teacher.".to_string(),
        EnrollmentError::NotFound => "That teacher no longer exists.".to_string(),
        _ => "Something went wrong. Please try again.".to_string(),
    }
}
