//! Country gate for the investor relations pages.
//!
//! The decision is a pure function of the request path and the country code
//! the edge platform attaches to the request. A missing country code is
//! treated as "not allowed".

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoPolicy {
    /// Path prefix of the gated page family, e.g. "/investors"
    pub protected_prefix: String,
    /// ISO 3166-1 alpha-2 code allowed to see the gated pages
    pub allowed_country: String,
    /// Where denied visitors are sent
    pub redirect_to: String,
    /// Request header carrying the visitor's country
    pub country_header: String,
}

impl Default for GeoPolicy {
    fn default() -> Self {
        Self {
            protected_prefix: "/investors".to_string(),
            allowed_country: "VN".to_string(),
            redirect_to: "/404".to_string(),
            country_header: "x-vercel-ip-country".to_string(),
        }
    }
}

impl GeoPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            protected_prefix: config.geo_protected_prefix.clone(),
            allowed_country: config.geo_allowed_country.clone(),
            redirect_to: config.geo_redirect_to.clone(),
            country_header: config.geo_country_header.clone(),
        }
    }

    /// Whether `path` is the protected page or below it.
    pub fn protects(&self, path: &str) -> bool {
        let prefix = self.protected_prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Country code from the request headers, if present and readable.
    pub fn country<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(self.country_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoDecision {
    Allow,
    Redirect { to: String },
}

/// Decide access for one request.
pub fn decide(policy: &GeoPolicy, path: &str, country: Option<&str>) -> GeoDecision {
    if !policy.protects(path) {
        return GeoDecision::Allow;
    }

    match country {
        Some(code) if code.trim().eq_ignore_ascii_case(&policy.allowed_country) => {
            GeoDecision::Allow
        }
        _ => GeoDecision::Redirect {
            to: policy.redirect_to.clone(),
        },
    }
}

/// Middleware applying [`decide`] to every request before it is handled.
pub async fn geo_guard(
    State(policy): State<Arc<GeoPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let country = policy.country(request.headers());

    match decide(&policy, path, country) {
        GeoDecision::Allow => next.run(request).await,
        GeoDecision::Redirect { to } => {
            info!(
                "Geo guard denied {} (country: {})",
                path,
                country.unwrap_or("unknown")
            );
            Redirect::temporary(&to).into_response()
        }
    }
}
