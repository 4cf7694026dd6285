use std::path::Path;

use dioxus::prelude::*;
use dioxus_router::use_navigator;
use feedback_core::model::User;
use services::ProfileError;
use services::profile_service::AVATAR_EXTENSIONS;

use crate::context::{AppContext, use_current_user};
use crate::routes::Route;
use crate::views::{SignInPrompt, ViewError, ViewState, view_state_from_resource};
use crate::vm::format_datetime;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ProfileForm {
    name: String,
    email: String,
    avatar_path: String,
}

#[component]
pub fn ProfileView() -> Element {
    let ctx = use_context::<AppContext>();
    let user_id = use_current_user().map(|u| u.id());
    let profiles = ctx.profiles();

    let mut resource = use_resource(move || {
        let profiles = profiles.clone();
        async move {
            let user_id = user_id.ok_or(ViewError::Unauthorized)?;
            profiles.get_profile(user_id).await.map_err(|err| match err {
                ProfileError::NotFound => ViewError::NotFound,
                _ => ViewError::Unknown,
            })
        }
    });

    if user_id.is_none() {
        return rsx! { SignInPrompt { required: None } };
    }

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page profile",
            h2 { "Profile" }
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(user) => rsx! {
                    ProfileEditor { key: "{user.id().value()}", user }
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
fn ProfileEditor(user: User) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let user_id = user.id();
    let initial = ProfileForm {
        name: user.name().to_string(),
        email: user.email().to_string(),
        avatar_path: String::new(),
    };
    let mut form = use_signal(move || initial);
    let mut avatar_url = use_signal(|| user.avatar_url().map(str::to_string));
    let mut notice = use_signal(|| None::<String>);
    let mut error = use_signal(|| None::<String>);
    let mut confirm_delete = use_signal(|| false);

    let on_save = {
        let profiles = ctx.profiles();
        let auth = ctx.auth();
        use_callback(move |()| {
            let current = form();
            let profiles = profiles.clone();
            let auth = auth.clone();
            spawn(async move {
                match profiles
                    .update_profile(user_id, &current.name, &current.email)
                    .await
                {
                    Ok(updated) => {
                        auth.refresh_user(updated);
                        error.set(None);
                        notice.set(Some("Profile saved.".to_string()));
                    }
                    Err(err) => {
                        notice.set(None);
                        error.set(Some(profile_error_message(&err)));
                    }
                }
            });
        })
    };

    let on_upload = {
        let profiles = ctx.profiles();
        let auth = ctx.auth();
        use_callback(move |()| {
            let path = form.read().avatar_path.trim().to_string();
            if path.is_empty() {
                error.set(Some("Choose an image file first.".to_string()));
                return;
            }
            let profiles = profiles.clone();
            let auth = auth.clone();
            spawn(async move {
                let file_name = Path::new(&path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                let bytes = match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::warn!(path = %path, error = %err, "avatar read failed");
                        error.set(Some("Couldn't read that file.".to_string()));
                        return;
                    }
                };
                match profiles.upload_avatar(user_id, &file_name, &bytes).await {
                    Ok(updated) => {
                        avatar_url.set(updated.avatar_url().map(str::to_string));
                        auth.refresh_user(updated);
                        form.write().avatar_path.clear();
                        error.set(None);
                        notice.set(Some("Picture updated.".to_string()));
                    }
                    Err(err) => {
                        notice.set(None);
                        error.set(Some(profile_error_message(&err)));
                    }
                }
            });
        })
    };

    let on_delete = {
        let profiles = ctx.profiles();
        let auth = ctx.auth();
        use_callback(move |()| {
            let profiles = profiles.clone();
            let auth = auth.clone();
            spawn(async move {
                match profiles.delete_account(user_id).await {
                    Ok(()) => {
                        auth.sign_out();
                        navigator.push(Route::Auth {});
                    }
                    Err(err) => {
                        confirm_delete.set(false);
                        error.set(Some(profile_error_message(&err)));
                    }
                }
            });
        })
    };

    let current = form();
    let accepted = AVATAR_EXTENSIONS.join(", ");

    rsx! {
        div { class: "profile-card",
            match avatar_url() {
                Some(url) => rsx! { img { class: "avatar", src: "{url}", alt: "Profile picture" } },
                None => rsx! { span { class: "avatar avatar--placeholder", "{user.initial()}" } },
            }
            p { class: "hint", "{user.role().as_str()} · joined {format_datetime(user.created_at())}" }
        }

        section { class: "form-section",
            label { "Name"
                input {
                    r#type: "text",
                    value: "{current.name}",
                    oninput: move |evt| form.write().name = evt.value(),
                }
            }
            label { "Email"
                input {
                    r#type: "email",
                    value: "{current.email}",
                    oninput: move |evt| form.write().email = evt.value(),
                }
            }
            button {
                class: "btn btn-primary",
                r#type: "button",
                onclick: move |_| on_save.call(()),
                "Save"
            }
        }

        section { class: "form-section",
            h3 { "Profile picture" }
            label { "Image file ({accepted})"
                input {
                    r#type: "text",
                    placeholder: "/path/to/picture.png",
                    value: "{current.avatar_path}",
                    oninput: move |evt| form.write().avatar_path = evt.value(),
                }
            }
            button {
                class: "btn btn-secondary",
                r#type: "button",
                onclick: move |_| on_upload.call(()),
                "Upload"
            }
        }

        if let Some(message) = notice() {
            p { class: "notice", "{message}" }
        }
        if let Some(message) = error() {
            p { class: "error", "{message}" }
        }

        section { class: "form-section danger-zone",
            h3 { "Delete account" }
            if confirm_delete() {
                p { "This removes your profile and enrollments. Continue?" }
                button {
                    class: "btn btn-danger",
                    r#type: "button",
                    onclick: move |_| on_delete.call(()),
                    "Delete my account"
                }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| confirm_delete.set(false),
                    "Cancel"
                }
            } else {
                button {
                    class: "btn btn-danger",
                    r#type: "button",
                    onclick: move |_| confirm_delete.set(true),
                    "Delete account"
                }
            }
        }
    }
}

fn profile_error_message(err: &ProfileError) -> String {
    match err {
        ProfileError::EmptyName => "Name is required.".to_string(),
        ProfileError::EmailTaken => "That email is already in use.".to_string(),
        ProfileError::User(_) => "Please enter a valid email address.".to_string(),
        ProfileError::UnsupportedImage(_) => {
            format!("Pictures must be one of: {}.", AVATAR_EXTENSIONS.join(", "))
        }
        _ => "Something went wrong. Please try again.".to_string(),
    }
}
