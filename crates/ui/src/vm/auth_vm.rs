use feedback_core::model::Role;
use services::AuthError;
use services::password::MIN_PASSWORD_LEN;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
    ForgotPassword,
}

/// Fields of the sign-in / sign-up / forgot-password form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthFormVm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub role: Role,
}

impl Default for AuthFormVm {
    fn default() -> Self {
        Self {
            mode: AuthMode::SignIn,
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            name: String::new(),
            role: Role::Student,
        }
    }
}

impl AuthFormVm {
    /// Switch tabs. Passwords are cleared, the email is kept.
    pub fn switch_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.password.clear();
        self.confirm_password.clear();
    }

    /// Checks done before anything is sent to the auth service.
    ///
    /// # Errors
    ///
    /// Returns the message to show inline under the form.
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("Email is required.".to_string());
        }
        match self.mode {
            AuthMode::SignIn => {
                if self.password.is_empty() {
                    return Err("Password is required.".to_string());
                }
            }
            AuthMode::SignUp => {
                if self.name.trim().is_empty() {
                    return Err("Name is required.".to_string());
                }
                if self.password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(format!(
                        "Password must be at least {MIN_PASSWORD_LEN} characters."
                    ));
                }
                if self.password != self.confirm_password {
                    return Err("Passwords do not match.".to_string());
                }
            }
            AuthMode::ForgotPassword => {}
        }
        Ok(())
    }

    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            AuthMode::SignIn => "Sign in",
            AuthMode::SignUp => "Create account",
            AuthMode::ForgotPassword => "Send reset link",
        }
    }
}

/// Inline message for an auth failure.
#[must_use]
pub fn auth_error_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
        AuthError::DuplicateRegistration => {
            "An account with this email already exists.".to_string()
        }
        AuthError::WeakPassword { min } => format!("Password must be at least {min} characters."),
        AuthError::EmptyName => "Name is required.".to_string(),
        AuthError::InvalidResetToken => "This reset link is invalid or has expired.".to_string(),
        AuthError::User(_) => "Please enter a valid email address.".to_string(),
        _ => "Something went wrong. Please try again.".to_string(),
    }
}
