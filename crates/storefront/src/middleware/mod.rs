//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, ...)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Session expiry (drop the customer token after an API 401)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, SessionExpired, clear_current_customer,
    session_expiry_middleware, set_current_customer,
};
pub use request_id::request_id_middleware;
pub use security_headers::{content_security_policy, security_headers_middleware};
pub use session::create_session_layer;
