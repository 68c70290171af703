//! Billing event reconciler.
//!
//! Applies signed provider events to the local subscription mirror and the
//! payment ledger. Every handler is safe to run more than once for the same
//! event: delivery is at-least-once and ordering is not guaranteed.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    app_error::{AppError, AppResult},
    application::{analytics::Analytics, notifications::Notifier},
    domain::entities::{
        billing_event::{
            BillingEvent, BillingEventKind, StripeInvoiceObject, StripeSubscriptionObject,
        },
        payment::Payment,
        subscription::{Subscription, SubscriptionStatus, SubscriptionUpdate},
    },
    infra::webhook_signature,
    props,
};

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Insert unless a row with the same `stripe_subscription_id` exists.
    /// Returns true if a row was inserted.
    async fn insert_if_absent(&self, subscription: &Subscription) -> AppResult<bool>;

    /// Insert or fully overwrite the row keyed by `stripe_subscription_id`.
    async fn upsert(&self, subscription: &Subscription) -> AppResult<Subscription>;

    /// Overwrite status, price and period. Returns `None` when no row exists.
    async fn update_billing(
        &self,
        stripe_subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> AppResult<Option<Subscription>>;

    /// Change only the status. Returns `None` when no row exists.
    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> AppResult<Option<Subscription>>;
}

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    /// Insert unless a row with the same `stripe_event_id` exists.
    /// Returns true if a row was inserted.
    async fn insert_if_absent(&self, payment: &Payment) -> AppResult<bool>;
}

/// Resolves the local user behind a provider customer.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn email_for_customer(&self, stripe_customer_id: &str) -> AppResult<Option<String>>;
}

#[async_trait]
pub trait WebhookEventRepo: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool>;
    async fn mark_processed(&self, event_id: &str, event_type: &str) -> AppResult<()>;
}

// ============================================================================
// Types
// ============================================================================

/// What to do when an event targets a subscription we have no row for.
///
/// Events can arrive out of order, so an "updated" may precede its "created".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSubscriptionPolicy {
    /// Create the row from the event payload.
    #[default]
    Upsert,
    /// Fail with `SubscriptionNotFound`; the sender will redeliver later.
    Reject,
}

impl FromStr for MissingSubscriptionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upsert" => Ok(MissingSubscriptionPolicy::Upsert),
            "reject" => Ok(MissingSubscriptionPolicy::Reject),
            other => Err(format!(
                "unknown missing subscription policy '{}', expected 'upsert' or 'reject'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Handled(BillingEventKind),
    /// Event id already in the processed log.
    Duplicate,
    /// Event type we do not act on.
    Ignored,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct BillingWebhookUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
    payment_repo: Arc<dyn PaymentRepo>,
    event_repo: Arc<dyn WebhookEventRepo>,
    analytics: Arc<Analytics>,
    webhook_secret: SecretString,
    tolerance_secs: i64,
    missing_policy: MissingSubscriptionPolicy,
    notifications: Option<(Arc<dyn CustomerDirectory>, Arc<Notifier>)>,
}

impl BillingWebhookUseCases {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepo>,
        payment_repo: Arc<dyn PaymentRepo>,
        event_repo: Arc<dyn WebhookEventRepo>,
        analytics: Arc<Analytics>,
        webhook_secret: SecretString,
        tolerance_secs: i64,
        missing_policy: MissingSubscriptionPolicy,
    ) -> Self {
        Self {
            subscription_repo,
            payment_repo,
            event_repo,
            analytics,
            webhook_secret,
            tolerance_secs,
            missing_policy,
            notifications: None,
        }
    }

    /// Email the customer on confirmed subscriptions and failed payments.
    pub fn with_notifications(
        mut self,
        customers: Arc<dyn CustomerDirectory>,
        notifier: Arc<Notifier>,
    ) -> Self {
        self.notifications = Some((customers, notifier));
        self
    }

    /// Look up the customer's email for a notification. Lookup failures only skip the email.
    async fn notification_target(
        &self,
        stripe_customer_id: Option<&str>,
    ) -> Option<(String, &Notifier)> {
        let (customers, notifier) = self.notifications.as_ref()?;
        let customer_id = stripe_customer_id?;
        match customers.email_for_customer(customer_id).await {
            Ok(Some(email)) => Some((email, notifier.as_ref())),
            Ok(None) => {
                tracing::debug!(customer_id, "No user linked to customer, skipping email");
                None
            }
            Err(e) => {
                tracing::warn!(customer_id, error = %e, "Customer lookup failed, skipping email");
                None
            }
        }
    }

    /// Verify, parse and apply one webhook delivery.
    ///
    /// Nothing in `body` is parsed before the signature checks out.
    pub async fn reconcile(&self, body: &str, signature: Option<&str>) -> AppResult<WebhookOutcome> {
        let Some(signature) = signature else {
            tracing::warn!("Webhook request without signature header");
            return Err(AppError::InvalidSignature);
        };
        webhook_signature::verify(
            body,
            signature,
            self.webhook_secret.expose_secret(),
            self.tolerance_secs,
        )?;

        let event = BillingEvent::parse(body)?;

        let Some(kind) = event.kind() else {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.event_type,
                "Unhandled webhook event type"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        if !event.id.is_empty() && self.event_repo.is_processed(&event.id).await? {
            tracing::info!(event_id = %event.id, "Webhook event already processed, skipping");
            return Ok(WebhookOutcome::Duplicate);
        }

        tracing::info!(event_id = %event.id, event_type = kind.as_str(), "Processing webhook event");

        match kind {
            BillingEventKind::SubscriptionCreated => self.handle_subscription_created(&event).await?,
            BillingEventKind::SubscriptionUpdated => self.handle_subscription_updated(&event).await?,
            BillingEventKind::SubscriptionDeleted => self.handle_subscription_deleted(&event).await?,
            BillingEventKind::PaymentSucceeded => self.handle_payment_succeeded(&event).await?,
            BillingEventKind::PaymentFailed => self.handle_payment_failed(&event).await?,
        }

        if !event.id.is_empty()
            && let Err(e) = self.event_repo.mark_processed(&event.id, kind.as_str()).await
        {
            // Handlers are idempotent; a redelivery will just run them again.
            tracing::warn!(event_id = %event.id, error = %e, "Failed to record processed event");
        }

        Ok(WebhookOutcome::Handled(kind))
    }

    async fn handle_subscription_created(&self, event: &BillingEvent) -> AppResult<()> {
        let object: StripeSubscriptionObject = event.object()?;
        let subscription = object.to_subscription()?;

        // A late "created" must not overwrite state from newer events
        if !self.subscription_repo.insert_if_absent(&subscription).await? {
            tracing::info!(
                subscription_id = %subscription.stripe_subscription_id,
                "Subscription already recorded, keeping current state"
            );
            return Ok(());
        }

        tracing::info!(
            subscription_id = %subscription.stripe_subscription_id,
            status = %subscription.status,
            "Subscription created"
        );
        self.analytics.track_business_event(
            "subscription_created",
            props! {
                "subscription_id" => subscription.stripe_subscription_id,
                "price_id" => subscription.stripe_price_id,
                "status" => subscription.status.as_str(),
            },
        );

        if subscription.status.is_active()
            && let Some((email, notifier)) = self
                .notification_target(subscription.stripe_customer_id.as_deref())
                .await
        {
            notifier
                .subscription_confirmed(&email, &subscription.stripe_price_id)
                .await;
        }
        Ok(())
    }

    async fn handle_subscription_updated(&self, event: &BillingEvent) -> AppResult<()> {
        let object: StripeSubscriptionObject = event.object()?;
        let update = object.to_update()?;

        if self
            .subscription_repo
            .update_billing(&object.id, &update)
            .await?
            .is_some()
        {
            tracing::info!(subscription_id = %object.id, status = %update.status, "Subscription updated");
            return Ok(());
        }

        match self.missing_policy {
            MissingSubscriptionPolicy::Upsert => {
                tracing::warn!(
                    subscription_id = %object.id,
                    "Update for unknown subscription, creating it from the event"
                );
                self.subscription_repo
                    .upsert(&object.to_subscription()?)
                    .await?;
                Ok(())
            }
            MissingSubscriptionPolicy::Reject => {
                tracing::warn!(subscription_id = %object.id, "Update for unknown subscription rejected");
                Err(AppError::SubscriptionNotFound(object.id))
            }
        }
    }

    async fn handle_subscription_deleted(&self, event: &BillingEvent) -> AppResult<()> {
        let object: StripeSubscriptionObject = event.object()?;

        let found = self
            .subscription_repo
            .set_status(&object.id, SubscriptionStatus::Canceled)
            .await?
            .is_some();

        if !found {
            match self.missing_policy {
                MissingSubscriptionPolicy::Upsert => {
                    tracing::warn!(
                        subscription_id = %object.id,
                        "Deletion for unknown subscription, recording it as canceled"
                    );
                    let mut subscription = object.to_subscription()?;
                    subscription.status = SubscriptionStatus::Canceled;
                    self.subscription_repo.upsert(&subscription).await?;
                }
                MissingSubscriptionPolicy::Reject => {
                    tracing::warn!(subscription_id = %object.id, "Deletion for unknown subscription rejected");
                    return Err(AppError::SubscriptionNotFound(object.id));
                }
            }
        }

        tracing::info!(subscription_id = %object.id, "Subscription canceled");
        self.analytics.track_business_event(
            "subscription_cancelled",
            props! { "subscription_id" => object.id },
        );
        Ok(())
    }

    async fn handle_payment_succeeded(&self, event: &BillingEvent) -> AppResult<()> {
        let invoice: StripeInvoiceObject = event.object()?;
        let payment = invoice.to_payment(&event.id)?;

        let inserted = self.payment_repo.insert_if_absent(&payment).await?;
        if !inserted {
            tracing::debug!(key = %payment.stripe_event_id, "Payment already recorded");
            return Ok(());
        }

        tracing::info!(
            key = %payment.stripe_event_id,
            customer_id = %payment.stripe_customer_id,
            amount = payment.amount,
            currency = %payment.currency,
            "Payment recorded"
        );
        self.analytics.track_business_event(
            "payment_succeeded",
            props! {
                "customer_id" => payment.stripe_customer_id,
                "amount" => payment.amount,
                "currency" => payment.currency,
            },
        );
        Ok(())
    }

    async fn handle_payment_failed(&self, event: &BillingEvent) -> AppResult<()> {
        let invoice: StripeInvoiceObject = event.object()?;
        // No state change; the customer is asked to update their payment method.
        tracing::warn!(
            event_id = %event.id,
            invoice_id = ?invoice.id,
            customer_id = ?invoice.customer_id(),
            subscription_id = ?invoice.subscription.as_ref().map(|s| s.id()),
            amount_due = invoice.amount_due,
            attempt_count = ?invoice.attempt_count,
            "Invoice payment failed"
        );
        self.analytics.track_business_event(
            "payment_failed",
            props! {
                "customer_id" => invoice.customer_id(),
                "amount_due" => invoice.amount_due,
            },
        );

        if let Some((email, notifier)) = self.notification_target(invoice.customer_id()).await {
            notifier.payment_failed(&email).await;
        }
        Ok(())
    }
}
