//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires the real use cases to in-memory repos, a
//! recording email sender and the demo auth provider. The repos are public so tests can seed and inspect them.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::{auth::demo::DemoAuthProvider, http::app_state::AppState},
    application::{
        analytics::Analytics,
        jwt,
        notifications::Notifier,
        ports::{auth_provider::AuthProvider, billing_provider::BillingProvider},
        use_cases::{
            auth::AuthUseCases,
            billing_webhook::{BillingWebhookUseCases, MissingSubscriptionPolicy},
            checkout::CheckoutUseCases,
            route_guard::RoutePolicy,
        },
    },
    infra::{
        RateLimiter,
        config::{AppConfig, AuthProviderConfig, EmailProviderConfig},
    },
    test_utils::{
        FakeBillingProvider, InMemoryPaymentRepo, InMemoryRateLimiter, InMemorySubscriptionRepo,
        InMemoryUserRepo, InMemoryWebhookEventRepo, RecordingEmailSender, TEST_JWT_SECRET,
        TEST_WEBHOOK_SECRET, test_session_user,
    },
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// ```ignore
/// let builder = TestAppStateBuilder::new();
/// builder.subscriptions.insert(create_test_subscription(|_| {}));
/// let app_state = builder.build();
/// ```
pub struct TestAppStateBuilder {
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub payments: Arc<InMemoryPaymentRepo>,
    pub events: Arc<InMemoryWebhookEventRepo>,
    pub users: Arc<InMemoryUserRepo>,
    pub analytics: Arc<Analytics>,
    pub emails: Arc<RecordingEmailSender>,
    billing_provider: Arc<dyn BillingProvider>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    rate_limiter: Arc<dyn RateLimiter>,
    missing_policy: MissingSubscriptionPolicy,
    trust_proxy: bool,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            subscriptions: Arc::new(InMemorySubscriptionRepo::new()),
            payments: Arc::new(InMemoryPaymentRepo::new()),
            events: Arc::new(InMemoryWebhookEventRepo::new()),
            users: Arc::new(InMemoryUserRepo::new()),
            analytics: Arc::new(Analytics::new()),
            emails: Arc::new(RecordingEmailSender::new()),
            billing_provider: Arc::new(FakeBillingProvider::new()),
            auth_provider: None,
            rate_limiter: Arc::new(InMemoryRateLimiter::permissive()),
            missing_policy: MissingSubscriptionPolicy::Upsert,
            trust_proxy: false,
        }
    }

    pub fn with_billing_provider(mut self, provider: Arc<dyn BillingProvider>) -> Self {
        self.billing_provider = provider;
        self
    }

    /// Replace the demo auth provider.
    pub fn with_auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn with_missing_policy(mut self, policy: MissingSubscriptionPolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// A valid demo session token for `test_session_user()`.
    pub fn session_token(&self) -> String {
        jwt::issue(
            &test_session_user(),
            &SecretString::from(TEST_JWT_SECRET),
            Duration::hours(1),
        )
        .unwrap()
    }

    pub fn build(&self) -> AppState {
        let app_origin = Url::parse("http://localhost:3000").unwrap();

        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse().unwrap(),
            database_url: String::new(),
            app_origin: app_origin.clone(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            stripe_secret_key: SecretString::from("sk_test"),
            stripe_webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET),
            webhook_tolerance_secs: 300,
            missing_subscription_policy: self.missing_policy,
            auth_provider: AuthProviderConfig::Demo {
                jwt_secret: SecretString::from(TEST_JWT_SECRET),
            },
            session_ttl: Duration::hours(1),
            email_provider: EmailProviderConfig::Log,
            route_policy: RoutePolicy::default(),
            redis_url: None,
            rate_limit_window_secs: 60,
            rate_limit_per_ip: 60,
            trust_proxy: self.trust_proxy,
            static_dir: PathBuf::from("public"),
            log_file: None,
        });

        let auth_provider: Arc<dyn AuthProvider> = self.auth_provider.clone().unwrap_or_else(|| {
            Arc::new(DemoAuthProvider::new(
                SecretString::from(TEST_JWT_SECRET),
                Duration::hours(1),
            ))
        });

        let notifier = Arc::new(Notifier::new(self.emails.clone(), app_origin.clone()));

        let auth_use_cases = AuthUseCases::new(
            auth_provider,
            self.analytics.clone(),
            app_origin.clone(),
        )
        .with_notifier(notifier.clone());

        let billing_webhook_use_cases = BillingWebhookUseCases::new(
            self.subscriptions.clone(),
            self.payments.clone(),
            self.events.clone(),
            self.analytics.clone(),
            SecretString::from(TEST_WEBHOOK_SECRET),
            300,
            self.missing_policy,
        )
        .with_notifications(self.users.clone(), notifier);

        let checkout_use_cases = CheckoutUseCases::new(
            self.users.clone(),
            self.billing_provider.clone(),
            self.analytics.clone(),
            app_origin,
        );

        let route_policy = Arc::new(config.route_policy.clone());

        AppState {
            config,
            auth_use_cases: Arc::new(auth_use_cases),
            billing_webhook_use_cases: Arc::new(billing_webhook_use_cases),
            checkout_use_cases: Arc::new(checkout_use_cases),
            route_policy,
            rate_limiter: self.rate_limiter.clone(),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
