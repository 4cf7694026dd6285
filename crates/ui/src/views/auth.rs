use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};
use feedback_core::model::Role;
use services::password::MIN_PASSWORD_LEN;

use crate::context::AppContext;
use crate::routes::{Route, dashboard_route};
use crate::vm::{AuthFormVm, AuthMode, auth_error_message};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Notice {
    Info(String),
    Error(String),
}

#[component]
pub fn AuthView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut form = use_signal(AuthFormVm::default);
    let mut notice = use_signal(|| None::<Notice>);
    let mut busy = use_signal(|| false);

    let on_submit = use_callback(move |()| {
        let current = form();
        if let Err(message) = current.validate() {
            notice.set(Some(Notice::Error(message)));
            return;
        }
        let auth = ctx.auth();
        spawn(async move {
            busy.set(true);
            match current.mode {
                AuthMode::SignIn => match auth.sign_in(&current.email, &current.password).await {
                    Ok(session) => {
                        notice.set(None);
                        navigator.push(dashboard_route(session.user.role()));
                    }
                    Err(err) => notice.set(Some(Notice::Error(auth_error_message(&err)))),
                },
                AuthMode::SignUp => match auth
                    .sign_up(&current.email, &current.password, &current.name, current.role)
                    .await
                {
                    Ok(_) => {
                        form.write().switch_mode(AuthMode::SignIn);
                        notice.set(Some(Notice::Info(
                            "Account created. Sign in to continue.".to_string(),
                        )));
                    }
                    Err(err) => notice.set(Some(Notice::Error(auth_error_message(&err)))),
                },
                AuthMode::ForgotPassword => match auth.request_password_reset(&current.email).await {
                    Ok(()) => notice.set(Some(Notice::Info(
                        "If an account exists for that email, a reset link is on its way."
                            .to_string(),
                    ))),
                    Err(err) => notice.set(Some(Notice::Error(auth_error_message(&err)))),
                },
            }
            busy.set(false);
        });
    });

    let current = form();
    let mode = current.mode;
    let heading = match mode {
        AuthMode::SignIn => "Sign in",
        AuthMode::SignUp => "Create an account",
        AuthMode::ForgotPassword => "Reset your password",
    };

    rsx! {
        div { class: "page auth-page",
            h2 { "{heading}" }

            div { class: "tabs",
                ModeTab { label: "Sign in", mode: AuthMode::SignIn, active: mode, form, notice }
                ModeTab { label: "Sign up", mode: AuthMode::SignUp, active: mode, form, notice }
            }

            form {
                class: "auth-form",
                onsubmit: move |evt| {
                    evt.prevent_default();
                    on_submit.call(());
                },

                if mode == AuthMode::SignUp {
                    label { "Name"
                        input {
                            r#type: "text",
                            value: "{current.name}",
                            oninput: move |evt| form.write().name = evt.value(),
                        }
                    }
                }

                label { "Email"
                    input {
                        r#type: "email",
                        value: "{current.email}",
                        oninput: move |evt| form.write().email = evt.value(),
                    }
                }

                if mode != AuthMode::ForgotPassword {
                    label { "Password"
                        input {
                            r#type: "password",
                            value: "{current.password}",
                            oninput: move |evt| form.write().password = evt.value(),
                        }
                    }
                }

                if mode == AuthMode::SignUp {
                    label { "Confirm password"
                        input {
                            r#type: "password",
                            value: "{current.confirm_password}",
                            oninput: move |evt| form.write().confirm_password = evt.value(),
                        }
                    }
                    p { class: "hint", "At least {MIN_PASSWORD_LEN} characters." }
                    fieldset { class: "role-picker",
                        legend { "I am a" }
                        RoleOption { label: "Student", role: Role::Student, form }
                        RoleOption { label: "Teacher", role: Role::Teacher, form }
                    }
                }

                match notice() {
                    Some(Notice::Error(message)) => rsx! { p { class: "error", "{message}" } },
                    Some(Notice::Info(message)) => rsx! { p { class: "notice", "{message}" } },
                    None => rsx! {},
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: busy(),
                    if busy() { "Please wait..." } else { "{current.submit_label()}" }
                }
            }

            if mode == AuthMode::ForgotPassword {
                button {
                    class: "link-button",
                    r#type: "button",
                    onclick: move |_| {
                        form.write().switch_mode(AuthMode::SignIn);
                        notice.set(None);
                    },
                    "Back to sign in"
                }
            } else {
                button {
                    class: "link-button",
                    r#type: "button",
                    onclick: move |_| {
                        form.write().switch_mode(AuthMode::ForgotPassword);
                        notice.set(None);
                    },
                    "Forgot your password?"
                }
            }
        }
    }
}

#[component]
fn ModeTab(
    label: &'static str,
    mode: AuthMode,
    active: AuthMode,
    mut form: Signal<AuthFormVm>,
    mut notice: Signal<Option<Notice>>,
) -> Element {
    rsx! {
        button {
            class: if mode == active { "tab tab--active" } else { "tab" },
            r#type: "button",
            onclick: move |_| {
                form.write().switch_mode(mode);
                notice.set(None);
            },
            "{label}"
        }
    }
}

#[component]
fn RoleOption(label: &'static str, role: Role, mut form: Signal<AuthFormVm>) -> Element {
    let checked = form.read().role == role;
    rsx! {
        label { class: "radio",
            input {
                r#type: "radio",
                name: "role",
                checked: checked,
                onchange: move |_| form.write().role = role,
            }
            "{label}"
        }
    }
}

#[component]
pub fn ResetPasswordView(token: String) -> Element {
    let ctx = use_context::<AppContext>();
    let mut password = use_signal(String::new);
    let mut confirm = use_signal(String::new);
    let mut notice = use_signal(|| None::<Notice>);
    let mut done = use_signal(|| false);

    let on_submit = use_callback(move |()| {
        let new_password = password();
        if new_password != confirm() {
            notice.set(Some(Notice::Error("Passwords do not match.".to_string())));
            return;
        }
        let auth = ctx.auth();
        let token = token.clone();
        spawn(async move {
            match auth.reset_password(&token, &new_password).await {
                Ok(()) => {
                    done.set(true);
                    notice.set(Some(Notice::Info(
                        "Your password has been updated.".to_string(),
                    )));
                }
                Err(err) => notice.set(Some(Notice::Error(auth_error_message(&err)))),
            }
        });
    });

    rsx! {
        div { class: "page auth-page",
            h2 { "Choose a new password" }
            if !done() {
                form {
                    class: "auth-form",
                    onsubmit: move |evt| {
                        evt.prevent_default();
                        on_submit.call(());
                    },
                    label { "New password"
                        input {
                            r#type: "password",
                            value: "{password}",
                            oninput: move |evt| password.set(evt.value()),
                        }
                    }
                    label { "Confirm password"
                        input {
                            r#type: "password",
                            value: "{confirm}",
                            oninput: move |evt| confirm.set(evt.value()),
                        }
                    }
                    button { class: "btn btn-primary", r#type: "submit", "Update password" }
                }
            }
            match notice() {
                Some(Notice::Error(message)) => rsx! { p { class: "error", "{message}" } },
                Some(Notice::Info(message)) => rsx! { p { class: "notice", "{message}" } },
                None => rsx! {},
            }
            Link { to: Route::Auth {}, "Back to sign in" }
        }
    }
}
