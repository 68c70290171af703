use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing_webhook::WebhookEventRepo,
};

#[async_trait]
impl WebhookEventRepo for PostgresPersistence {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM webhook_events WHERE event_id = $1)")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::from)?;
        Ok(exists)
    }

    async fn mark_processed(&self, event_id: &str, event_type: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO webhook_events (event_id, event_type) VALUES ($1, $2) ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(event_type)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
