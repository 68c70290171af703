use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing_webhook::SubscriptionRepo,
    domain::entities::subscription::{Subscription, SubscriptionStatus, SubscriptionUpdate},
};

fn row_to_subscription(row: sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        stripe_subscription_id: row.get("stripe_subscription_id"),
        stripe_customer_id: row.get("stripe_customer_id"),
        status: row.get("status"),
        stripe_price_id: row.get("stripe_price_id"),
        current_period_start: row.get("current_period_start"),
        current_period_end: row.get("current_period_end"),
    }
}

const SELECT_COLS: &str = r#"
    stripe_subscription_id, stripe_customer_id, status, stripe_price_id,
    current_period_start, current_period_end
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn insert_if_absent(&self, subscription: &Subscription) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions
                (stripe_subscription_id, stripe_customer_id, status, stripe_price_id,
                 current_period_start, current_period_end)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (stripe_subscription_id) DO NOTHING
            "#,
        )
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_customer_id)
        .bind(subscription.status)
        .bind(&subscription.stripe_price_id)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert(&self, subscription: &Subscription) -> AppResult<Subscription> {
        // A later event without a customer must not erase a known one
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions
                (stripe_subscription_id, stripe_customer_id, status, stripe_price_id,
                 current_period_start, current_period_end)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (stripe_subscription_id) DO UPDATE
            SET stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, subscriptions.stripe_customer_id),
                status = EXCLUDED.status,
                stripe_price_id = EXCLUDED.stripe_price_id,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                updated_at = NOW()
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_customer_id)
        .bind(subscription.status)
        .bind(&subscription.stripe_price_id)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(row))
    }

    async fn update_billing(
        &self,
        stripe_subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions
            SET status = $2,
                stripe_price_id = $3,
                current_period_start = $4,
                current_period_end = $5,
                updated_at = NOW()
            WHERE stripe_subscription_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(stripe_subscription_id)
        .bind(update.status)
        .bind(&update.stripe_price_id)
        .bind(update.current_period_start)
        .bind(update.current_period_end)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_subscription))
    }

    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions
            SET status = $2, updated_at = NOW()
            WHERE stripe_subscription_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(stripe_subscription_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_subscription))
    }
}
