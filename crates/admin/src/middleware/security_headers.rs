//! Security headers middleware for admin.
//!
//! Stricter than the storefront: no framing at all, no referrer, and HSTS
//! when the panel is served over HTTPS. Product images come from the API
//! origin, which is the only extra image source.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use storehouse_core::ApiBaseUrl;

use crate::state::AppState;

/// Build the admin CSP for a given API origin.
#[must_use]
pub fn content_security_policy(api: &ApiBaseUrl) -> HeaderValue {
    let api_origin = api.as_url().origin().ascii_serialization();
    let policy = format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         img-src 'self' data: blob: {api_origin}; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'none'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    );
    HeaderValue::from_str(&policy).unwrap_or_else(|_| {
        HeaderValue::from_static("default-src 'none'; img-src 'self'; style-src 'self'")
    })
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy` - see [`content_security_policy`]
/// - `Cache-Control: no-store`
/// - `Strict-Transport-Security` - HTTPS deployments only
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, state.csp().clone());
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store"),
    );
    if state.config().is_secure() {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_is_strict() {
        let csp = ApiBaseUrl::parse("http://localhost:5000")
            .map(|api| content_security_policy(&api))
            .ok();
        let csp = csp.as_ref().and_then(|v| v.to_str().ok()).unwrap_or_default();
        assert!(csp.contains("img-src 'self' data: blob: http://localhost:5000;"));
        assert!(csp.contains("base-uri 'none'"));
    }
}
