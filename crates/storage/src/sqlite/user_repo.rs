use feedback_core::model::{Role, User, UserId};

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_user_row};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn ensure_user(&self, user: &User) -> Result<User, StorageError> {
        let id = id_to_i64("user_id", user.id().value())?;
        // The no-op update lets RETURNING yield the existing row on conflict.
        let row = sqlx::query(
            r"
            INSERT INTO users (id, name, email, role, avatar_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET id = users.id
            RETURNING id, name, email, role, avatar_url, created_at
            ",
        )
        .bind(id)
        .bind(user.name())
        .bind(user.email().as_str())
        .bind(user.role().as_str())
        .bind(user.avatar_url())
        .bind(user.created_at())
        .fetch_one(&self.pool)
        .await
        .map_err(db)?;

        map_user_row(&row)
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE users SET name = ?1, email = ?2, avatar_url = ?3
            WHERE id = ?4
            ",
        )
        .bind(user.name())
        .bind(user.email().as_str())
        .bind(user.avatar_url())
        .bind(id_to_i64("user_id", user.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, role, avatar_url, created_at
            FROM users WHERE id = ?1
            ",
        )
        .bind(id_to_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, role, avatar_url, created_at
            FROM users
            WHERE role = ?1
            ORDER BY name ASC, id ASC
            ",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(map_user_row).collect()
    }
}
