//! Transactional email notifications.
//!
//! Delivery is best-effort: a failed send is logged and never fails the
//! operation that triggered it.

use std::sync::Arc;

use url::Url;

use crate::application::{
    email_templates::{
        EmailTemplate, payment_failed_email, subscription_confirmed_email, welcome_email,
    },
    ports::email_sender::{EmailMessage, EmailSender},
};

pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    app_origin: Url,
}

impl Notifier {
    pub fn new(sender: Arc<dyn EmailSender>, app_origin: Url) -> Self {
        Self { sender, app_origin }
    }

    pub async fn welcome(&self, to: &str, name: Option<&str>) {
        self.deliver(to, "welcome", welcome_email(name)).await;
    }

    pub async fn subscription_confirmed(&self, to: &str, plan_name: &str) {
        let template = subscription_confirmed_email(&self.app_origin, None, plan_name);
        self.deliver(to, "subscription_confirmed", template).await;
    }

    pub async fn payment_failed(&self, to: &str) {
        let template = payment_failed_email(&self.app_origin, None);
        self.deliver(to, "payment_failed", template).await;
    }

    async fn deliver(&self, to: &str, kind: &'static str, template: EmailTemplate) {
        let message = EmailMessage {
            to: to.to_string(),
            subject: template.subject,
            html: template.html,
            text: template.text,
        };
        match self.sender.send(&message).await {
            Ok(()) => tracing::info!(kind, "Notification email sent"),
            Err(e) => tracing::warn!(kind, error = %e, "Failed to send notification email"),
        }
    }
}
