use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing_webhook::PaymentRepo,
    domain::entities::payment::Payment,
};

#[async_trait]
impl PaymentRepo for PostgresPersistence {
    async fn insert_if_absent(&self, payment: &Payment) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments
                (stripe_event_id, stripe_invoice_id, stripe_payment_intent_id,
                 stripe_customer_id, amount, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (stripe_event_id) DO NOTHING
            "#,
        )
        .bind(&payment.stripe_event_id)
        .bind(&payment.stripe_invoice_id)
        .bind(&payment.stripe_payment_intent_id)
        .bind(&payment.stripe_customer_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }
}
