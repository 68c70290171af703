//! Billing provider event envelope and the provider objects we act on.
//!
//! Parsing only happens after the payload signature has been verified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        payment::{Payment, PaymentStatus},
        subscription::{Subscription, SubscriptionStatus, SubscriptionUpdate},
    },
};

/// Event types the reconciler acts on. Everything else is acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    PaymentSucceeded,
    PaymentFailed,
}

impl BillingEventKind {
    pub fn from_type(event_type: &str) -> Option<Self> {
        match event_type {
            "customer.subscription.created" => Some(BillingEventKind::SubscriptionCreated),
            "customer.subscription.updated" => Some(BillingEventKind::SubscriptionUpdated),
            "customer.subscription.deleted" => Some(BillingEventKind::SubscriptionDeleted),
            "invoice.payment_succeeded" => Some(BillingEventKind::PaymentSucceeded),
            "invoice.payment_failed" => Some(BillingEventKind::PaymentFailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingEventKind::SubscriptionCreated => "customer.subscription.created",
            BillingEventKind::SubscriptionUpdated => "customer.subscription.updated",
            BillingEventKind::SubscriptionDeleted => "customer.subscription.deleted",
            BillingEventKind::PaymentSucceeded => "invoice.payment_succeeded",
            BillingEventKind::PaymentFailed => "invoice.payment_failed",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: BillingEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingEventData {
    pub object: serde_json::Value,
}

impl BillingEvent {
    pub fn parse(body: &str) -> AppResult<Self> {
        serde_json::from_str(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))
    }

    pub fn kind(&self) -> Option<BillingEventKind> {
        BillingEventKind::from_type(&self.event_type)
    }

    /// Deserialize `data.object` into a typed provider object.
    pub fn object<T: DeserializeOwned>(&self) -> AppResult<T> {
        T::deserialize(&self.data.object).map_err(|e| {
            AppError::InvalidInput(format!("Invalid {} object: {}", self.event_type, e))
        })
    }
}

/// A provider reference that may arrive as a bare id or as an expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<Expandable>,
    pub status: String,
    #[serde(default)]
    pub items: StripeItemList,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeItemList {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePriceRef,
    // Newer API versions carry the billing period on the item instead.
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePriceRef {
    pub id: String,
}

fn timestamp(secs: i64, field: &str) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid {} timestamp", field)))
}

impl StripeSubscriptionObject {
    pub fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_stripe(&self.status)
    }

    pub fn price_id(&self) -> AppResult<&str> {
        self.items
            .data
            .first()
            .map(|item| item.price.id.as_str())
            .ok_or_else(|| AppError::InvalidInput(format!("Subscription {} has no items", self.id)))
    }

    pub fn period(&self) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.items.data.first();
        let start = self
            .current_period_start
            .or_else(|| first.and_then(|i| i.current_period_start))
            .ok_or_else(|| AppError::InvalidInput("Missing current_period_start".into()))?;
        let end = self
            .current_period_end
            .or_else(|| first.and_then(|i| i.current_period_end))
            .ok_or_else(|| AppError::InvalidInput("Missing current_period_end".into()))?;
        Ok((
            timestamp(start, "current_period_start")?,
            timestamp(end, "current_period_end")?,
        ))
    }

    pub fn to_subscription(&self) -> AppResult<Subscription> {
        let (current_period_start, current_period_end) = self.period()?;
        Ok(Subscription {
            stripe_subscription_id: self.id.clone(),
            stripe_customer_id: self.customer.as_ref().map(|c| c.id().to_string()),
            status: self.status(),
            stripe_price_id: self.price_id()?.to_string(),
            current_period_start,
            current_period_end,
        })
    }

    pub fn to_update(&self) -> AppResult<SubscriptionUpdate> {
        let (current_period_start, current_period_end) = self.period()?;
        Ok(SubscriptionUpdate {
            status: self.status(),
            stripe_price_id: self.price_id()?.to_string(),
            current_period_start,
            current_period_end,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceObject {
    pub id: Option<String>,
    pub customer: Option<Expandable>,
    pub payment_intent: Option<Expandable>,
    pub subscription: Option<Expandable>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: Option<String>,
    pub attempt_count: Option<i64>,
}

impl StripeInvoiceObject {
    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(Expandable::id)
    }

    /// Build a ledger entry for a successful payment.
    ///
    /// The event id is the idempotency key; payloads without one fall back to
    /// the invoice id.
    pub fn to_payment(&self, event_id: &str) -> AppResult<Payment> {
        let key = if !event_id.is_empty() {
            event_id.to_string()
        } else {
            self.id
                .clone()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::InvalidInput("Payment event has no id".into()))?
        };

        let customer = self
            .customer_id()
            .ok_or_else(|| AppError::InvalidInput("Invoice has no customer".into()))?;

        Ok(Payment {
            stripe_event_id: key,
            stripe_invoice_id: self.id.clone(),
            stripe_payment_intent_id: self.payment_intent.as_ref().map(|p| p.id().to_string()),
            stripe_customer_id: customer.to_string(),
            amount: self.amount_paid,
            currency: self.currency.clone().unwrap_or_default(),
            status: PaymentStatus::Succeeded,
        })
    }
}
