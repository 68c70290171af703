//! In-memory mock implementations for billing-related traits.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::billing_provider::{BillingProvider, CheckoutRequest},
        use_cases::{
            billing_webhook::{CustomerDirectory, PaymentRepo, SubscriptionRepo, WebhookEventRepo},
            checkout::UserRepo,
        },
    },
    domain::entities::{
        payment::Payment,
        subscription::{Subscription, SubscriptionStatus, SubscriptionUpdate},
    },
};

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

/// Keyed by subscription id, like the `subscriptions` primary key.
#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<String, Subscription>>,
    fail_writes: AtomicBool,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.stripe_subscription_id.clone(), subscription);
    }

    pub fn get(&self, stripe_subscription_id: &str) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(stripe_subscription_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    /// Make every write fail with a database error.
    pub fn fail_next_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("Database operation failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert_if_absent(&self, subscription: &Subscription) -> AppResult<bool> {
        self.check_writable()?;
        let mut subs = self.subscriptions.lock().unwrap();
        if subs.contains_key(&subscription.stripe_subscription_id) {
            return Ok(false);
        }
        subs.insert(
            subscription.stripe_subscription_id.clone(),
            subscription.clone(),
        );
        Ok(true)
    }

    async fn upsert(&self, subscription: &Subscription) -> AppResult<Subscription> {
        self.check_writable()?;
        let mut subs = self.subscriptions.lock().unwrap();
        let mut row = subscription.clone();
        // Mirrors the COALESCE on stripe_customer_id
        if row.stripe_customer_id.is_none() {
            row.stripe_customer_id = subs
                .get(&row.stripe_subscription_id)
                .and_then(|s| s.stripe_customer_id.clone());
        }
        subs.insert(row.stripe_subscription_id.clone(), row.clone());
        Ok(row)
    }

    async fn update_billing(
        &self,
        stripe_subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> AppResult<Option<Subscription>> {
        self.check_writable()?;
        let mut subs = self.subscriptions.lock().unwrap();
        Ok(subs.get_mut(stripe_subscription_id).map(|s| {
            s.status = update.status;
            s.stripe_price_id = update.stripe_price_id.clone();
            s.current_period_start = update.current_period_start;
            s.current_period_end = update.current_period_end;
            s.clone()
        }))
    }

    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> AppResult<Option<Subscription>> {
        self.check_writable()?;
        let mut subs = self.subscriptions.lock().unwrap();
        Ok(subs.get_mut(stripe_subscription_id).map(|s| {
            s.status = status;
            s.clone()
        }))
    }
}

// ============================================================================
// InMemoryPaymentRepo
// ============================================================================

/// Keyed by `stripe_event_id`, like the unique index on `payments`.
#[derive(Default)]
pub struct InMemoryPaymentRepo {
    pub payments: Mutex<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    pub fn get(&self, stripe_event_id: &str) -> Option<Payment> {
        self.payments.lock().unwrap().get(stripe_event_id).cloned()
    }
}

#[async_trait]
impl PaymentRepo for InMemoryPaymentRepo {
    async fn insert_if_absent(&self, payment: &Payment) -> AppResult<bool> {
        let mut payments = self.payments.lock().unwrap();
        if payments.contains_key(&payment.stripe_event_id) {
            return Ok(false);
        }
        payments.insert(payment.stripe_event_id.clone(), payment.clone());
        Ok(true)
    }
}

// ============================================================================
// InMemoryWebhookEventRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryWebhookEventRepo {
    pub events: Mutex<HashSet<String>>,
}

impl InMemoryWebhookEventRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.events.lock().unwrap().contains(event_id)
    }

    /// Forget all processed events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl WebhookEventRepo for InMemoryWebhookEventRepo {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        Ok(self.contains(event_id))
    }

    async fn mark_processed(&self, event_id: &str, _event_type: &str) -> AppResult<()> {
        self.events.lock().unwrap().insert(event_id.to_string());
        Ok(())
    }
}

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    /// user id -> provider customer id
    pub customers: Mutex<HashMap<String, String>>,
    /// user id -> email
    pub emails: Mutex<HashMap<String, String>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user already linked to a provider customer.
    pub fn link(&self, user_id: &str, email: &str, stripe_customer_id: &str) {
        self.emails
            .lock()
            .unwrap()
            .insert(user_id.to_string(), email.to_string());
        self.customers
            .lock()
            .unwrap()
            .insert(user_id.to_string(), stripe_customer_id.to_string());
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_stripe_customer_id(&self, user_id: &str) -> AppResult<Option<String>> {
        Ok(self.customers.lock().unwrap().get(user_id).cloned())
    }

    async fn set_stripe_customer_id(
        &self,
        user_id: &str,
        email: &str,
        stripe_customer_id: &str,
    ) -> AppResult<()> {
        self.link(user_id, email, stripe_customer_id);
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryUserRepo {
    async fn email_for_customer(&self, stripe_customer_id: &str) -> AppResult<Option<String>> {
        let user_id = self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|(_, customer)| customer.as_str() == stripe_customer_id)
            .map(|(user, _)| user.clone());
        Ok(user_id.and_then(|id| self.emails.lock().unwrap().get(&id).cloned()))
    }
}

// ============================================================================
// FakeBillingProvider
// ============================================================================

/// Hands out sequential `cus_fake_N` / `cs_fake_N` ids.
#[derive(Default)]
pub struct FakeBillingProvider {
    customers: AtomicUsize,
    sessions: AtomicUsize,
    last_checkout: Mutex<Option<CheckoutRequest>>,
    fail: bool,
}

impl FakeBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a provider error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn customers_created(&self) -> usize {
        self.customers.load(Ordering::SeqCst)
    }

    pub fn last_checkout(&self) -> Option<CheckoutRequest> {
        self.last_checkout.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingProvider for FakeBillingProvider {
    async fn create_customer(&self, _email: &str, _user_id: &str) -> AppResult<String> {
        if self.fail {
            return Err(AppError::Provider("Stripe unavailable".into()));
        }
        let n = self.customers.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("cus_fake_{n}"))
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<String> {
        if self.fail {
            return Err(AppError::Provider("Stripe unavailable".into()));
        }
        *self.last_checkout.lock().unwrap() = Some(request.clone());
        let n = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("cs_fake_{n}"))
    }
}
