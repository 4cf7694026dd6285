use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

use feedback_core::model::{Email, Role, User, UserId};
use storage::repository::{
    AccountRepository, NewAccountRecord, PasswordResetRecord, StorageError, UserRepository,
};

use crate::Clock;
use crate::error::AuthError;
use crate::mailer::{Mailer, ResetMail};
use crate::password::{self, MIN_PASSWORD_LEN};

/// How long a password-reset token stays usable.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// The signed-in user, as seen by every screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub signed_in_at: DateTime<Utc>,
}

/// Registers accounts, signs users in and out, and broadcasts auth-state changes.
pub struct AuthService {
    clock: Clock,
    accounts: Arc<dyn AccountRepository>,
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    state: watch::Sender<Option<AuthSession>>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        clock: Clock,
        accounts: Arc<dyn AccountRepository>,
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            clock,
            accounts,
            users,
            mailer,
            state,
        }
    }

    /// Create an account. The profile row is created on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::User` for a malformed email, `AuthError::WeakPassword`
    /// for short passwords, `AuthError::EmptyName` for a blank name and
    /// `AuthError::DuplicateRegistration` if the email is taken.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<UserId, AuthError> {
        let email = Email::new(email)?;
        if !password::is_acceptable(password) {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::EmptyName);
        }

        let password_hash = password::hash_password(password)?;
        let id = self
            .accounts
            .insert_account(NewAccountRecord {
                email,
                password_hash,
                name: name.to_string(),
                role,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|e| match e {
                StorageError::Conflict => AuthError::DuplicateRegistration,
                other => AuthError::Storage(other),
            })?;

        tracing::info!(user_id = id.value(), role = role.as_str(), "account registered");
        Ok(id)
    }

    /// Check credentials, make sure the profile exists and publish the new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a wrong password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let Ok(email) = Email::new(email) else {
            return Err(AuthError::InvalidCredentials);
        };
        let Some(account) = self.accounts.find_account_by_email(&email).await? else {
            tracing::warn!("sign-in rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !password::verify_password(password, &account.password_hash)? {
            tracing::warn!(user_id = account.id.value(), "sign-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.users.ensure_user(&account.to_profile()).await?;
        let session = AuthSession {
            user,
            signed_in_at: self.clock.now(),
        };
        self.state.send_replace(Some(session.clone()));
        tracing::info!(user_id = account.id.value(), "signed in");
        Ok(session)
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.state.send_replace(None) {
            tracing::info!(user_id = previous.user.id().value(), "signed out");
        }
    }

    #[must_use]
    pub fn current_session(&self) -> Option<AuthSession> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every sign-in, sign-out and profile refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.state.subscribe()
    }

    /// Replace the signed-in user's profile after it was edited elsewhere.
    pub fn refresh_user(&self, user: User) {
        self.state.send_if_modified(|state| match state {
            Some(session) if session.user.id() == user.id() && session.user != user => {
                session.user = user;
                true
            }
            _ => false,
        });
    }

    /// Issue a reset token and mail it. Unknown addresses succeed silently.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::User` for a malformed email, or storage and mail failures.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::new(email)?;
        let Some(account) = self.accounts.find_account_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let expires_at = self.clock.now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let token = uuid::Uuid::new_v4().to_string();
        self.accounts
            .insert_password_reset(PasswordResetRecord {
                token: token.clone(),
                account_id: account.id,
                expires_at,
                consumed: false,
            })
            .await?;
        self.mailer
            .send_password_reset(ResetMail {
                to: account.email,
                token,
                expires_at,
            })
            .await?;
        Ok(())
    }

    /// Set a new password using a mailed token. Tokens work once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for short passwords and
    /// `AuthError::InvalidResetToken` for unknown, used or expired tokens.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if !password::is_acceptable(new_password) {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let Some(account_id) = self
            .accounts
            .consume_password_reset(token.trim(), self.clock.now())
            .await?
        else {
            tracing::warn!("password reset rejected: invalid token");
            return Err(AuthError::InvalidResetToken);
        };

        let hash = password::hash_password(new_password)?;
        self.accounts.update_password_hash(account_id, &hash).await?;
        tracing::info!(user_id = account_id.value(), "password reset");
        Ok(())
    }

    /// Change the sign-in email on the account and its profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::User` for a malformed email and
    /// `AuthError::DuplicateRegistration` if another account uses it.
    pub async fn update_email(&self, user_id: UserId, email: &str) -> Result<User, AuthError> {
        let email = Email::new(email)?;
        self.accounts
            .update_account_email(user_id, &email)
            .await
            .map_err(|e| match e {
                StorageError::Conflict => AuthError::DuplicateRegistration,
                other => AuthError::Storage(other),
            })?;

        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        self.refresh_user(user.clone());
        tracing::info!(user_id = user_id.value(), "email updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use feedback_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    use crate::mailer::RecordingMailer;

    fn service(mailer: RecordingMailer) -> (AuthService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let auth = AuthService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(mailer),
        );
        (auth, repo)
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_creates_profile_once() {
        let (auth, repo) = service(RecordingMailer::new());
        let id = auth
            .sign_up("  Ada@School.EDU ", "secret1", "Ada", Role::Teacher)
            .await
            .unwrap();
        assert!(repo.get_user(id).await.unwrap().is_none());

        let session = auth.sign_in("ada@school.edu", "secret1").await.unwrap();
        assert_eq!(session.user.id(), id);
        assert_eq!(session.user.email().as_str(), "ada@school.edu");
        assert_eq!(auth.current_session(), Some(session.clone()));

        auth.sign_out();
        let again = auth.sign_in("ADA@school.edu", "secret1").await.unwrap();
        assert_eq!(again.user, session.user);
    }

    #[tokio::test]
    async fn duplicate_email_and_weak_password_are_rejected() {
        let (auth, _) = service(RecordingMailer::new());
        auth.sign_up("a@b.co", "secret1", "A", Role::Student)
            .await
            .unwrap();

        let dup = auth.sign_up("A@B.CO", "secret2", "B", Role::Student).await;
        assert!(matches!(dup, Err(AuthError::DuplicateRegistration)));

        let weak = auth.sign_up("c@b.co", "12345", "C", Role::Student).await;
        assert!(matches!(weak, Err(AuthError::WeakPassword { min: 6 })));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (auth, _) = service(RecordingMailer::new());
        auth.sign_up("a@b.co", "secret1", "A", Role::Student)
            .await
            .unwrap();

        let wrong = auth.sign_in("a@b.co", "nope-nope").await;
        let unknown = auth.sign_in("z@b.co", "secret1").await;
        let garbage = auth.sign_in("not an email", "secret1").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(garbage, Err(AuthError::InvalidCredentials)));
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_sign_in_and_sign_out() {
        let (auth, _) = service(RecordingMailer::new());
        auth.sign_up("a@b.co", "secret1", "A", Role::Student)
            .await
            .unwrap();
        let mut rx = auth.subscribe();
        assert!(rx.borrow().is_none());

        auth.sign_in("a@b.co", "secret1").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());

        auth.sign_out();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn reset_flow_replaces_password_once() {
        let mailer = RecordingMailer::new();
        let (auth, _) = service(mailer.clone());
        auth.sign_up("a@b.co", "secret1", "A", Role::Student)
            .await
            .unwrap();

        auth.request_password_reset("nobody@b.co").await.unwrap();
        assert!(mailer.sent().is_empty());

        auth.request_password_reset("a@b.co").await.unwrap();
        let mail = mailer.sent().pop().unwrap();
        assert_eq!(mail.to.as_str(), "a@b.co");

        auth.reset_password(&mail.token, "brand-new").await.unwrap();
        assert!(auth.sign_in("a@b.co", "secret1").await.is_err());
        assert!(auth.sign_in("a@b.co", "brand-new").await.is_ok());

        let reused = auth.reset_password(&mail.token, "another1").await;
        assert!(matches!(reused, Err(AuthError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn update_email_refreshes_current_session() {
        let (auth, _) = service(RecordingMailer::new());
        let id = auth
            .sign_up("a@b.co", "secret1", "A", Role::Teacher)
            .await
            .unwrap();
        auth.sign_up("taken@b.co", "secret1", "T", Role::Teacher)
            .await
            .unwrap();
        auth.sign_in("a@b.co", "secret1").await.unwrap();

        let clash = auth.update_email(id, "taken@b.co").await;
        assert!(matches!(clash, Err(AuthError::DuplicateRegistration)));

        let user = auth.update_email(id, "new@b.co").await.unwrap();
        assert_eq!(user.email().as_str(), "new@b.co");
        let current = auth.current_session().unwrap();
        assert_eq!(current.user.email().as_str(), "new@b.co");
        assert!(auth.sign_in("new@b.co", "secret1").await.is_ok());
    }
}
