use chrono::{DateTime, Utc};
use feedback_core::model::{Email, UserId};

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_account_row, user_id_from_i64};
use crate::repository::{
    AccountRecord, AccountRepository, NewAccountRecord, PasswordResetRecord, StorageError,
};

#[async_trait::async_trait]
impl AccountRepository for SqliteRepository {
    async fn insert_account(&self, account: NewAccountRecord) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO accounts (email, password_hash, name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(account.email.as_str())
        .bind(account.password_hash)
        .bind(account.name)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AccountRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, email, password_hash, name, role, created_at
            FROM accounts WHERE email = ?1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.as_ref().map(map_account_row).transpose()
    }

    async fn get_account(&self, id: UserId) -> Result<Option<AccountRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, email, password_hash, name, role, created_at
            FROM accounts WHERE id = ?1
            ",
        )
        .bind(id_to_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        row.as_ref().map(map_account_row).transpose()
    }

    async fn update_account_email(&self, id: UserId, email: &Email) -> Result<(), StorageError> {
        let id = id_to_i64("user_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        let res = sqlx::query("UPDATE accounts SET email = ?1 WHERE id = ?2")
            .bind(email.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("UPDATE users SET email = ?1 WHERE id = ?2")
            .bind(email.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        tx.commit().await.map_err(db)
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE accounts SET password_hash = ?1 WHERE id = ?2")
            .bind(hash)
            .bind(id_to_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_account(&self, id: UserId) -> Result<(), StorageError> {
        let id = id_to_i64("user_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query("DELETE FROM student_teachers WHERE student_id = ?1 OR teacher_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        sqlx::query("DELETE FROM password_resets WHERE account_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        let res = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(db)
    }

    async fn insert_password_reset(&self, reset: PasswordResetRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO password_resets (token, account_id, expires_at, consumed)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(reset.token)
        .bind(id_to_i64("account_id", reset.account_id.value())?)
        .bind(reset.expires_at)
        .bind(i64::from(reset.consumed))
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    async fn consume_password_reset(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StorageError> {
        let account_id: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE password_resets SET consumed = 1
            WHERE token = ?1 AND consumed = 0 AND expires_at > ?2
            RETURNING account_id
            ",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        account_id.map(user_id_from_i64).transpose()
    }
}
