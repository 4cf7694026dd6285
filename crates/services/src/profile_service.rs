use std::path::Path;
use std::sync::Arc;

use feedback_core::model::{Email, Role, User, UserId};
use storage::objects::AvatarStore;
use storage::repository::{AccountRepository, StorageError, UserRepository};

use crate::error::ProfileError;

/// Image extensions accepted for profile pictures.
pub const AVATAR_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Reads and edits profiles, including the avatar image.
#[derive(Clone)]
pub struct ProfileService {
    accounts: Arc<dyn AccountRepository>,
    users: Arc<dyn UserRepository>,
    avatars: Arc<dyn AvatarStore>,
}

impl ProfileService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        users: Arc<dyn UserRepository>,
        avatars: Arc<dyn AvatarStore>,
    ) -> Self {
        Self {
            accounts,
            users,
            avatars,
        }
    }

    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if no profile exists for the id.
    pub async fn get_profile(&self, id: UserId) -> Result<User, ProfileError> {
        self.users.get_user(id).await?.ok_or(ProfileError::NotFound)
    }

    /// Update display name and email. A changed email is applied to the account too.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName`, `ProfileError::User` for a malformed
    /// email, or `ProfileError::EmailTaken` if another account uses the address.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let email = Email::new(email)?;
        let mut user = self.get_profile(id).await?;

        if user.email() != &email {
            self.accounts
                .update_account_email(id, &email)
                .await
                .map_err(|e| match e {
                    StorageError::Conflict => ProfileError::EmailTaken,
                    other => ProfileError::Storage(other),
                })?;
            user.set_email(email);
        }
        user.rename(name);
        self.users.update_user(&user).await?;
        tracing::info!(user_id = id.value(), "profile updated");
        Ok(user)
    }

    /// Store a new profile picture as `{user_id}.{ext}`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::UnsupportedImage` for empty files or unknown
    /// extensions, or `ProfileError::Storage` if the upload fails.
    pub async fn upload_avatar(
        &self,
        id: UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<User, ProfileError> {
        let ext = avatar_extension(file_name)
            .ok_or_else(|| ProfileError::UnsupportedImage(file_name.to_string()))?;
        if bytes.is_empty() {
            return Err(ProfileError::UnsupportedImage(file_name.to_string()));
        }
        let user = self.get_profile(id).await?;

        let key = format!("{}.{ext}", id.value());
        let url = self.avatars.put(&key, bytes).await?;
        let user = user.with_avatar_url(Some(url));
        self.users.update_user(&user).await?;
        tracing::info!(user_id = id.value(), key, "avatar uploaded");
        Ok(user)
    }

    /// Remove the account, its profile and its enrollments.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if the account does not exist.
    pub async fn delete_account(&self, id: UserId) -> Result<(), ProfileError> {
        self.accounts.delete_account(id).await.map_err(|e| match e {
            StorageError::NotFound => ProfileError::NotFound,
            other => ProfileError::Storage(other),
        })?;
        tracing::info!(user_id = id.value(), "account deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ProfileError::Storage` if the query fails.
    pub async fn list_students(&self) -> Result<Vec<User>, ProfileError> {
        Ok(self.users.list_users_by_role(Role::Student).await?)
    }

    /// # Errors
    ///
    /// Returns `ProfileError::Storage` if the query fails.
    pub async fn list_teachers(&self) -> Result<Vec<User>, ProfileError> {
        Ok(self.users.list_users_by_role(Role::Teacher).await?)
    }
}

/// Lower-cased extension of an accepted image file name.
fn avatar_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    AVATAR_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    use feedback_core::time::fixed_now;
    use storage::objects::InMemoryAvatarStore;
    use storage::repository::{InMemoryRepository, NewAccountRecord};

    async fn setup() -> (ProfileService, InMemoryRepository, UserId) {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_account(NewAccountRecord {
                email: Email::new("ada@school.edu").unwrap(),
                password_hash: "hash".into(),
                name: "Ada".into(),
                role: Role::Teacher,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let account = repo.get_account(id).await.unwrap().unwrap();
        repo.ensure_user(&account.to_profile()).await.unwrap();

        let service = ProfileService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(InMemoryAvatarStore::new("mem://avatars")),
        );
        (service, repo, id)
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(avatar_extension("me.PNG").as_deref(), Some("png"));
        assert_eq!(avatar_extension("me.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(avatar_extension("me.exe"), None);
        assert_eq!(avatar_extension("me"), None);
    }

    #[tokio::test]
    async fn update_profile_changes_name_and_account_email() {
        let (service, repo, id) = setup().await;

        let user = service
            .update_profile(id, "  Ada Lovelace ", "ADA.L@school.edu")
            .await
            .unwrap();
        assert_eq!(user.name(), "Ada Lovelace");
        assert_eq!(user.email().as_str(), "ada.l@school.edu");

        let account = repo.get_account(id).await.unwrap().unwrap();
        assert_eq!(account.email.as_str(), "ada.l@school.edu");

        let blank = service.update_profile(id, "  ", "ada.l@school.edu").await;
        assert!(matches!(blank, Err(ProfileError::EmptyName)));
    }

    #[tokio::test]
    async fn avatar_upload_overwrites_and_sets_url() {
        let (service, _, id) = setup().await;

        let first = service.upload_avatar(id, "me.png", b"one").await.unwrap();
        let second = service.upload_avatar(id, "me.png", b"two").await.unwrap();
        let expected = format!("mem://avatars/{}.png", id.value());
        assert_eq!(first.avatar_url(), Some(expected.as_str()));
        assert_eq!(second.avatar_url(), Some(expected.as_str()));
        assert_eq!(service.get_profile(id).await.unwrap(), second);

        let bad = service.upload_avatar(id, "me.txt", b"x").await;
        assert!(matches!(bad, Err(ProfileError::UnsupportedImage(_))));
    }

    #[tokio::test]
    async fn delete_account_removes_profile() {
        let (service, _, id) = setup().await;
        assert_eq!(service.list_teachers().await.unwrap().len(), 1);

        service.delete_account(id).await.unwrap();
        assert!(matches!(
            service.get_profile(id).await,
            Err(ProfileError::NotFound)
        ));
        assert!(service.list_teachers().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_account(id).await,
            Err(ProfileError::NotFound)
        ));
    }
}
