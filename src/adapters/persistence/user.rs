use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::{billing_webhook::CustomerDirectory, checkout::UserRepo},
};

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_stripe_customer_id(&self, user_id: &str) -> AppResult<Option<String>> {
        let customer: Option<Option<String>> =
            sqlx::query_scalar("SELECT stripe_customer_id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::from)?;
        Ok(customer.flatten())
    }

    async fn set_stripe_customer_id(
        &self,
        user_id: &str,
        email: &str,
        stripe_customer_id: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, stripe_customer_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET stripe_customer_id = EXCLUDED.stripe_customer_id,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(stripe_customer_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for PostgresPersistence {
    async fn email_for_customer(&self, stripe_customer_id: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT email FROM users WHERE stripe_customer_id = $1")
            .bind(stripe_customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }
}
