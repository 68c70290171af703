//! Development email sender: writes messages to the log instead of sending them.

use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    application::ports::email_sender::{EmailMessage, EmailSender},
};

#[derive(Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Email (not sent, log provider)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        let message = EmailMessage {
            to: "ada@example.com".into(),
            subject: "Welcome".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        };

        assert!(LogEmailSender.send(&message).await.is_ok());
    }
}
