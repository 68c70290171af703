use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

use super::InfraError;
use crate::application::use_cases::{
    billing_webhook::MissingSubscriptionPolicy, route_guard::RoutePolicy,
};

/// Which auth provider backs sessions.
pub enum AuthProviderConfig {
    /// Local HS256 sessions, any credentials accepted.
    Demo { jwt_secret: SecretString },
    Supabase { url: Url, anon_key: SecretString },
}

/// Which transport delivers transactional email.
pub enum EmailProviderConfig {
    /// Log messages instead of sending them.
    Log,
    Resend { api_key: SecretString, from: String },
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Public origin of the web app, used for checkout and password reset redirects.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Max allowed skew between the signature timestamp and now.
    pub webhook_tolerance_secs: i64,
    pub missing_subscription_policy: MissingSubscriptionPolicy,
    pub auth_provider: AuthProviderConfig,
    pub session_ttl: Duration,
    pub email_provider: EmailProviderConfig,
    pub route_policy: RoutePolicy,
    /// Rate limiting is disabled when unset.
    pub redis_url: Option<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    /// Whether to trust X-Forwarded-For headers. Only enable behind a reverse proxy.
    pub trust_proxy: bool,
    pub static_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let database_url: String = get_env("DATABASE_URL");
        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: "not a valid header value".into(),
                })?;

        let stripe_secret_key = SecretString::from(get_env::<String>("STRIPE_SECRET_KEY"));
        let stripe_webhook_secret = SecretString::from(get_env::<String>("STRIPE_WEBHOOK_SECRET"));
        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);

        let missing_subscription_policy: MissingSubscriptionPolicy =
            get_env_default("MISSING_SUBSCRIPTION_POLICY", String::from("upsert"))
                .parse()
                .map_err(|reason| InfraError::ConfigInvalid {
                    var: "MISSING_SUBSCRIPTION_POLICY",
                    reason,
                })?;

        let auth_provider = match get_env_default("AUTH_PROVIDER", String::from("demo")).as_str() {
            "demo" => AuthProviderConfig::Demo {
                jwt_secret: SecretString::from(get_env::<String>("JWT_SECRET")),
            },
            "supabase" => AuthProviderConfig::Supabase {
                url: get_env("SUPABASE_URL"),
                anon_key: SecretString::from(get_env::<String>("SUPABASE_ANON_KEY")),
            },
            other => {
                return Err(InfraError::ConfigInvalid {
                    var: "AUTH_PROVIDER",
                    reason: format!("unknown provider '{}', expected 'demo' or 'supabase'", other),
                });
            }
        };
        let session_ttl_secs: i64 = get_env_default("SESSION_TTL_SECS", 86_400);

        let email_provider = match get_env_default("EMAIL_PROVIDER", String::from("log")).as_str() {
            "log" => EmailProviderConfig::Log,
            "resend" => EmailProviderConfig::Resend {
                api_key: SecretString::from(get_env::<String>("RESEND_API_KEY")),
                from: get_env_default(
                    "EMAIL_FROM",
                    String::from("SaaS Entrepreneur <noreply@example.com>"),
                ),
            },
            other => {
                return Err(InfraError::ConfigInvalid {
                    var: "EMAIL_PROVIDER",
                    reason: format!("unknown provider '{}', expected 'log' or 'resend'", other),
                });
            }
        };

        let route_policy = RoutePolicy::new(
            prefix_list(&get_env_default(
                "PROTECTED_ROUTES",
                String::from("/dashboard,/settings,/billing"),
            )),
            prefix_list(&get_env_default(
                "AUTH_ONLY_ROUTES",
                String::from("/auth/signin,/auth/signup"),
            )),
        )
        .map_err(|e| InfraError::ConfigInvalid {
            var: "PROTECTED_ROUTES",
            reason: e.to_string(),
        })?;

        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        // Default to false - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let static_dir = PathBuf::from(get_env_default("STATIC_DIR", String::from("public")));
        let log_file: Option<PathBuf> = std::env::var("LOG_FILE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            database_url,
            app_origin,
            cors_origin,
            stripe_secret_key,
            stripe_webhook_secret,
            webhook_tolerance_secs,
            missing_subscription_policy,
            auth_provider,
            session_ttl: Duration::seconds(session_ttl_secs),
            email_provider,
            route_policy,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            trust_proxy,
            static_dir,
            log_file,
        })
    }

    /// Cookies are only marked `Secure` when the app is served over https.
    pub fn secure_cookies(&self) -> bool {
        self.app_origin.scheme() == "https"
    }
}

/// Split a comma separated list of path prefixes, dropping blanks.
fn prefix_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
