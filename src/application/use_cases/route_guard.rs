//! Route access policy: which paths need a session and which are only for
//! signed-out visitors.

use url::form_urlencoded;

use crate::app_error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    protected: Vec<String>,
    auth_only: Vec<String>,
    sign_in_path: String,
    dashboard_path: String,
    return_param: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            protected: vec!["/dashboard".into(), "/settings".into(), "/billing".into()],
            auth_only: vec!["/auth/signin".into(), "/auth/signup".into()],
            sign_in_path: "/auth/signin".into(),
            dashboard_path: "/dashboard".into(),
            return_param: "redirectTo".into(),
        }
    }
}

impl RoutePolicy {
    /// Build a policy from two prefix lists. The lists must not share a prefix
    /// and no prefix may extend one from the other list.
    pub fn new(protected: Vec<String>, auth_only: Vec<String>) -> AppResult<Self> {
        for p in &protected {
            for a in &auth_only {
                if p.starts_with(a.as_str()) || a.starts_with(p.as_str()) {
                    return Err(AppError::InvalidInput(format!(
                        "route prefix '{}' overlaps '{}'",
                        p, a
                    )));
                }
            }
        }
        Ok(Self {
            protected,
            auth_only,
            ..Self::default()
        })
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self.protected.iter().any(|p| path.starts_with(p.as_str())) {
            RouteClass::Protected
        } else if self.auth_only.iter().any(|p| path.starts_with(p.as_str())) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Unclassified
        }
    }

    pub fn decide(&self, path: &str, has_session: bool) -> GuardDecision {
        match (self.classify(path), has_session) {
            (RouteClass::Protected, false) => GuardDecision::Redirect(self.sign_in_redirect(path)),
            (RouteClass::AuthOnly, true) => GuardDecision::Redirect(self.dashboard_path.clone()),
            _ => GuardDecision::Allow,
        }
    }

    fn sign_in_redirect(&self, path: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.return_param, path)
            .finish();
        format!("{}?{}", self.sign_in_path, query)
    }
}

const STATIC_PREFIXES: &[&str] = &["/_next/static", "/_next/image", "/favicon.ico"];
const STATIC_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Paths the guard never inspects.
pub fn is_static_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
