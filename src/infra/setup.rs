use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        auth::{demo::DemoAuthProvider, supabase::SupabaseAuthProvider},
        email::{log::LogEmailSender, resend::ResendEmailSender},
        http::app_state::AppState,
    },
    application::{
        analytics::Analytics,
        notifications::Notifier,
        ports::{
            auth_provider::AuthProvider, billing_provider::BillingProvider,
            email_sender::EmailSender,
        },
        use_cases::{
            auth::AuthUseCases,
            billing_webhook::{
                BillingWebhookUseCases, CustomerDirectory, PaymentRepo, SubscriptionRepo,
                WebhookEventRepo,
            },
            checkout::{CheckoutUseCases, UserRepo},
        },
    },
    infra::{
        InfraError, NoopRateLimiter, RateLimiter, RedisRateLimiter,
        config::{AppConfig, AuthProviderConfig, EmailProviderConfig},
        http_client::try_build_client,
        postgres_persistence,
        stripe_client::StripeClient,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    init_tracing(config.log_file.as_deref())?;

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let http_client = try_build_client().map_err(InfraError::HttpClient)?;
    let analytics = Arc::new(Analytics::new());

    let rate_limiter: Arc<dyn RateLimiter> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Redis rate limiting enabled for API routes");
            Arc::new(
                RedisRateLimiter::new(url, config.rate_limit_window_secs, config.rate_limit_per_ip)
                    .await?,
            )
        }
        None => Arc::new(NoopRateLimiter),
    };

    let auth_provider: Arc<dyn AuthProvider> = match &config.auth_provider {
        AuthProviderConfig::Demo { jwt_secret } => {
            tracing::warn!("Using demo auth provider: any credentials are accepted");
            Arc::new(DemoAuthProvider::new(jwt_secret.clone(), config.session_ttl))
        }
        AuthProviderConfig::Supabase { url, anon_key } => Arc::new(SupabaseAuthProvider::new(
            http_client.clone(),
            url.clone(),
            anon_key.clone(),
        )),
    };

    let email_sender: Arc<dyn EmailSender> = match &config.email_provider {
        EmailProviderConfig::Log => {
            tracing::warn!("Using log email provider: emails are logged, not sent");
            Arc::new(LogEmailSender)
        }
        EmailProviderConfig::Resend { api_key, from } => Arc::new(ResendEmailSender::new(
            http_client.clone(),
            api_key.clone(),
            from.clone(),
        )),
    };
    let notifier = Arc::new(Notifier::new(email_sender, config.app_origin.clone()));

    let billing_provider: Arc<dyn BillingProvider> = Arc::new(StripeClient::new(
        http_client,
        config.stripe_secret_key.clone(),
    ));

    let auth_use_cases = AuthUseCases::new(
        auth_provider,
        analytics.clone(),
        config.app_origin.clone(),
    )
    .with_notifier(notifier.clone());

    let billing_webhook_use_cases = BillingWebhookUseCases::new(
        postgres_arc.clone() as Arc<dyn SubscriptionRepo>,
        postgres_arc.clone() as Arc<dyn PaymentRepo>,
        postgres_arc.clone() as Arc<dyn WebhookEventRepo>,
        analytics.clone(),
        config.stripe_webhook_secret.clone(),
        config.webhook_tolerance_secs,
        config.missing_subscription_policy,
    )
    .with_notifications(postgres_arc.clone() as Arc<dyn CustomerDirectory>, notifier);

    let checkout_use_cases = CheckoutUseCases::new(
        postgres_arc.clone() as Arc<dyn UserRepo>,
        billing_provider,
        analytics,
        config.app_origin.clone(),
    );

    let route_policy = Arc::new(config.route_policy.clone());

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        billing_webhook_use_cases: Arc::new(billing_webhook_use_cases),
        checkout_use_cases: Arc::new(checkout_use_cases),
        route_policy,
        rate_limiter,
    })
}

pub fn init_tracing(log_file: Option<&Path>) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "saas_core=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), only when configured
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(InfraError::LogFile)?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
    Ok(())
}
