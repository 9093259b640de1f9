//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. Product images are
//! served by the REST API, so its origin is the only extra image source.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use storehouse_core::ApiBaseUrl;

use crate::state::AppState;

/// Build the storefront CSP for a given API origin.
///
/// ```text
/// default-src 'none';
/// script-src 'self';
/// style-src 'self';
/// img-src 'self' data: <api origin>;
/// form-action 'self';
/// frame-ancestors 'none';
/// base-uri 'self'
/// ```
#[must_use]
pub fn content_security_policy(api: &ApiBaseUrl) -> HeaderValue {
    let api_origin = api.as_url().origin().ascii_serialization();
    let policy = format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: {api_origin}; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
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
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: same-origin`
/// - `Content-Security-Policy` - see [`content_security_policy`]
/// - `Cache-Control: no-store` - pages carry cart and account data
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));
    headers.insert(CONTENT_SECURITY_POLICY, state.csp().clone());
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_api_images() {
        let api = ApiBaseUrl::parse("https://api.example.com:8443/v1").ok();
        let csp = api.as_ref().map(content_security_policy);
        let csp = csp.as_ref().and_then(|v| v.to_str().ok()).unwrap_or_default();
        assert!(csp.contains("img-src 'self' data: https://api.example.com:8443;"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }
}
