//! Outgoing mail. Only password-reset links are sent.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedback_core::model::Email;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetMail {
    pub to: Email,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// # Errors
    ///
    /// Returns `MailError` if the message could not be handed off.
    async fn send_password_reset(&self, mail: ResetMail) -> Result<(), MailError>;
}

/// Writes reset links to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, mail: ResetMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            token = %mail.token,
            expires_at = %mail.expires_at,
            "password reset link issued"
        );
        Ok(())
    }
}

/// Keeps every message in memory so tests can read the token back.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<ResetMail>>>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<ResetMail> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, mail: ResetMail) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|e| MailError::Delivery(e.to_string()))?
            .push(mail);
        Ok(())
    }
}
