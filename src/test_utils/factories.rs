//! Test data factories with sensible defaults.
//!
//! Each factory accepts a closure to override specific fields:
//!
//! ```ignore
//! let sub = create_test_subscription(|s| s.status = SubscriptionStatus::PastDue);
//! ```

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    application::ports::auth_provider::SessionUser,
    domain::entities::subscription::{Subscription, SubscriptionStatus},
    infra::webhook_signature::sign_payload,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const TEST_JWT_SECRET: &str = "test_jwt_secret";

pub fn create_test_subscription(f: impl FnOnce(&mut Subscription)) -> Subscription {
    let mut subscription = Subscription {
        stripe_subscription_id: "sub_test".to_string(),
        stripe_customer_id: Some("cus_test".to_string()),
        status: SubscriptionStatus::Active,
        stripe_price_id: "price_basic".to_string(),
        current_period_start: DateTime::<Utc>::from_timestamp(1_690_000_000, 0).unwrap(),
        current_period_end: DateTime::<Utc>::from_timestamp(1_692_592_000, 0).unwrap(),
    };
    f(&mut subscription);
    subscription
}

pub fn test_session_user() -> SessionUser {
    SessionUser {
        id: "mock-user-id".to_string(),
        email: "test@example.com".to_string(),
        name: Some("Test User".to_string()),
    }
}

/// Signature header for `body` with the test secret and the current time.
pub fn sign_now(body: &str) -> String {
    sign_payload(TEST_WEBHOOK_SECRET, Utc::now().timestamp(), body).unwrap()
}

/// A `customer.subscription.*` event body for customer `cus_1`.
pub fn subscription_event(
    event_id: &str,
    event_type: &str,
    subscription_id: &str,
    status: &str,
    price_id: &str,
    period_start: i64,
    period_end: i64,
) -> String {
    json!({
        "id": event_id,
        "type": event_type,
        "data": {
            "object": {
                "id": subscription_id,
                "object": "subscription",
                "customer": "cus_1",
                "status": status,
                "items": {"data": [{"price": {"id": price_id}}]},
                "current_period_start": period_start,
                "current_period_end": period_end
            }
        }
    })
    .to_string()
}

/// An `invoice.*` event body in USD.
pub fn invoice_event(
    event_id: &str,
    event_type: &str,
    invoice_id: &str,
    customer_id: &str,
    amount: i64,
) -> String {
    json!({
        "id": event_id,
        "type": event_type,
        "data": {
            "object": {
                "id": invoice_id,
                "object": "invoice",
                "customer": customer_id,
                "payment_intent": format!("pi_{invoice_id}"),
                "subscription": "sub_1",
                "amount_paid": amount,
                "amount_due": amount,
                "currency": "usd",
                "attempt_count": 1
            }
        }
    })
    .to_string()
}
