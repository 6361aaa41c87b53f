//! Outbound email.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Failure to hand an email to the transport.
#[derive(Debug, Error)]
#[error("Mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Mailer that writes each email to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            recipient = %email.recipient,
            subject = %email.subject,
            "email dispatched"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<Email>,
    fail_on_send: bool,
}

/// In-memory mailer for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    outbox: Arc<RwLock<Outbox>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the mailer to fail every send.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.outbox.write().await.fail_on_send = fail;
    }

    /// Returns every email sent so far.
    pub async fn sent(&self) -> Vec<Email> {
        self.outbox.read().await.sent.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let mut outbox = self.outbox.write().await;
        if outbox.fail_on_send {
            return Err(MailError("SMTP connection refused".to_string()));
        }
        outbox.sent.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email {
            from: "store@example.com".into(),
            recipient: "a@example.com".into(),
            subject: "Hi".into(),
            html_body: "<p>Hi</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_send_records_email() {
        let mailer = InMemoryMailer::new();
        mailer.send(email()).await.unwrap();
        assert_eq!(mailer.sent().await, vec![email()]);
    }

    #[tokio::test]
    async fn test_fail_on_send() {
        let mailer = InMemoryMailer::new();
        mailer.set_fail_on_send(true).await;
        assert!(mailer.send(email()).await.is_err());
        assert!(mailer.sent().await.is_empty());
    }
}
