//! Billing provider webhook endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::{
    adapters::http::app_state::AppState, app_error::AppError,
    infra::webhook_signature::SIGNATURE_HEADER,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe/webhook", post(stripe_webhook))
}

/// POST /api/stripe/webhook
///
/// 2xx tells the sender to stop; anything else is redelivered. Signature and
/// payload failures are permanent, storage failures are not.
async fn stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    match app_state
        .billing_webhook_use_cases
        .reconcile(&body, signature)
        .await
    {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, "Webhook acknowledged");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(e) if e.is_retryable() => {
            tracing::error!(
                error = %e,
                retryable = true,
                "Webhook processing failed, returning 500 for retry"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Webhook processing failed" })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Webhook rejected");
            let message = match &e {
                AppError::InvalidSignature => "Invalid signature".to_string(),
                AppError::InvalidInput(msg) => msg.clone(),
                other => other.to_string(),
            };
            (e.status_code(), Json(json!({ "error": message }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;

    use crate::{
        application::use_cases::billing_webhook::MissingSubscriptionPolicy,
        domain::entities::subscription::SubscriptionStatus,
        infra::webhook_signature::sign_payload,
        test_utils::{
            TestAppStateBuilder, create_test_subscription, invoice_event, sign_now,
            subscription_event,
        },
    };

    fn signature_name() -> HeaderName {
        HeaderName::from_static(SIGNATURE_HEADER)
    }

    fn signature_value(header: &str) -> HeaderValue {
        HeaderValue::from_str(header).unwrap()
    }

    fn server(builder: &TestAppStateBuilder) -> TestServer {
        TestServer::new(router().with_state(builder.build())).unwrap()
    }

    fn sub_1_past_due() -> String {
        subscription_event(
            "evt_1",
            "customer.subscription.updated",
            "sub_1",
            "past_due",
            "price_pro",
            1700000000,
            1702592000,
        )
    }

    #[tokio::test]
    async fn valid_event_returns_received() {
        let builder = TestAppStateBuilder::new();
        let body = sub_1_past_due();

        let response = server(&builder)
            .post("/stripe/webhook")
            .add_header(signature_name(), signature_value(&sign_now(&body)))
            .text(body)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "received": true }));
        let row = builder.subscriptions.get("sub_1").unwrap();
        assert_eq!(row.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn missing_signature_returns_400() {
        let builder = TestAppStateBuilder::new();

        let response = server(&builder)
            .post("/stripe/webhook")
            .text(sub_1_past_due())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Invalid signature" }));
        assert_eq!(builder.subscriptions.len(), 0);
    }

    #[tokio::test]
    async fn wrong_secret_returns_400_without_mutation() {
        let builder = TestAppStateBuilder::new();
        builder
            .subscriptions
            .insert(create_test_subscription(|s| s.stripe_subscription_id = "sub_1".into()));
        let body = sub_1_past_due();
        let header = sign_payload("whsec_wrong", chrono::Utc::now().timestamp(), &body).unwrap();

        let response = server(&builder)
            .post("/stripe/webhook")
            .add_header(signature_name(), signature_value(&header))
            .text(body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let row = builder.subscriptions.get("sub_1").unwrap();
        assert_eq!(row.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn unknown_type_is_acknowledged() {
        let builder = TestAppStateBuilder::new();
        let body = json!({"id": "evt_9", "type": "customer.created", "data": {"object": {}}})
            .to_string();

        let response = server(&builder)
            .post("/stripe/webhook")
            .add_header(signature_name(), signature_value(&sign_now(&body)))
            .text(body)
            .await;

        response.assert_status_ok();
        assert_eq!(builder.subscriptions.len(), 0);
        assert_eq!(builder.payments.len(), 0);
    }

    #[tokio::test]
    async fn storage_failure_returns_500() {
        let builder = TestAppStateBuilder::new();
        builder.subscriptions.fail_next_writes(true);
        let body = sub_1_past_due();

        let response = server(&builder)
            .post("/stripe/webhook")
            .add_header(signature_name(), signature_value(&sign_now(&body)))
            .text(body)
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({ "error": "Webhook processing failed" }));
    }

    #[tokio::test]
    async fn unknown_subscription_under_reject_policy_returns_409() {
        let builder =
            TestAppStateBuilder::new().with_missing_policy(MissingSubscriptionPolicy::Reject);
        let body = sub_1_past_due();

        let response = server(&builder)
            .post("/stripe/webhook")
            .add_header(signature_name(), signature_value(&sign_now(&body)))
            .text(body)
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(builder.subscriptions.len(), 0);
    }

    #[tokio::test]
    async fn payment_redelivery_records_one_payment() {
        let builder = TestAppStateBuilder::new();
        let server = server(&builder);
        let body = invoice_event("evt_p", "invoice.payment_succeeded", "in_1", "cus_1", 1500);

        for _ in 0..2 {
            server
                .post("/stripe/webhook")
                .add_header(signature_name(), signature_value(&sign_now(&body)))
                .text(body.clone())
                .await
                .assert_status_ok();
        }

        assert_eq!(builder.payments.len(), 1);
    }
}
