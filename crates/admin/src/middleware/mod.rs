//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (stricter CSP for admin)
//! 5. Session layer (tower-sessions, in-memory store, SameSite=Strict)
//! 6. Session expiry (drop the admin token after an API 401)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, SessionExpired, clear_current_admin, require_permission,
    session_expiry_middleware, set_current_admin,
};
pub use request_id::request_id_middleware;
pub use security_headers::{content_security_policy, security_headers_middleware};
pub use session::create_session_layer;
