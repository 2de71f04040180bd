//! Outbound notification delivery.
//!
//! Templates are identified by name only; rendering and transport belong to
//! the `Mailer` implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

pub const TEMPLATE_USER_WELCOME: &str = "user_welcome";
pub const TEMPLATE_PASSWORD_RESET: &str = "token_password_reset";

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("delivery to {to} failed: {reason}")]
    Delivery { to: String, reason: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, template: &str, data: Value) -> Result<(), MailerError>;
}

/// Writes every message to the log instead of delivering it
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, template: &str, data: Value) -> Result<(), MailerError> {
        info!(from = %self.sender, to, template, data = %data, "Sending email");
        Ok(())
    }
}

/// A message captured by `RecordingMailer`
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: String,
    pub template: String,
    pub data: Value,
}

/// Keeps sent messages in memory so callers can inspect them
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, template: &str, data: Value) -> Result<(), MailerError> {
        let mut sent = self.sent.lock().map_err(|_| MailerError::Delivery {
            to: to.to_string(),
            reason: "mailbox lock poisoned".to_string(),
        })?;
        sent.push(SentMessage {
            to: to.to_string(),
            template: template.to_string(),
            data,
        });
        Ok(())
    }
}
