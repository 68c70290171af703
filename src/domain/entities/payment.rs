use serde::{Deserialize, Serialize};

/// Payment status for ledger entries. Only successful payments are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
}

/// Append-only payment ledger entry.
///
/// `stripe_event_id` is the idempotency key: a redelivered event never adds a
/// second row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub stripe_event_id: String,
    pub stripe_invoice_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_customer_id: String,
    /// Amount in the currency's minor unit (e.g. cents)
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
}
