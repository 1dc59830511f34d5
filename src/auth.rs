//! HTTP Basic Authentication for admin routes
//!
//! The store export contains every secret word, role and resume token, so it
//! is only reachable with admin credentials. Without them configured it is off.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct AdminAuth {
    /// Username for admin routes (None = admin routes disabled)
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AdminAuth {
    /// IMPOSTER_ADMIN_USERNAME and IMPOSTER_ADMIN_PASSWORD must both be set
    pub fn from_env() -> Self {
        let username = std::env::var("IMPOSTER_ADMIN_USERNAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let password = std::env::var("IMPOSTER_ADMIN_PASSWORD")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if username.is_some() && password.is_some() {
            tracing::info!("Admin authentication enabled");
            Self { username, password }
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "IMPOSTER_ADMIN_USERNAME and IMPOSTER_ADMIN_PASSWORD must both be set to enable admin routes"
                );
            }
            Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Validate credentials. Always false while disabled.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                constant_time_eq(u.as_bytes(), username.as_bytes())
                    & constant_time_eq(p.as_bytes(), password.as_bytes())
            }
            _ => false,
        }
    }

    /// Whether the request headers carry valid Basic credentials
    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        let Some(credentials) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))
        else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(credentials.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        match decoded.split_once(':') {
            Some((username, password)) => self.validate(username, password),
            None => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Middleware for HTTP Basic Authentication on admin routes
pub async fn admin_auth_middleware(
    State(auth): State<Arc<AdminAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if auth.authorizes(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected admin request to {}", request.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Imposter Admin\"")],
        "Unauthorized",
    )
        .into_response()
}
