//! Authentication middleware and extractors.
//!
//! The signed-in customer (and their API token) is kept in the session under
//! `tokenUser`. Its presence decides which cart a request reads.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a signed-in customer.
///
/// If the customer is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Error returned when authentication is required but the customer is not logged in.
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let customer: CurrentCustomer = session
            .get(session_keys::TOKEN_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        Ok(Self(customer))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if the customer is not logged in.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentCustomer>(session_keys::TOKEN_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Helper to set the current customer in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    // New identity, new session id.
    session.cycle_id().await?;
    session.insert(session_keys::TOKEN_USER, customer).await
}

/// Helper to clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::TOKEN_USER)
        .await?;
    Ok(())
}

/// Response marker set when the API rejected the customer's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Drop the stored customer when a handler reports an expired token.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some() {
        tracing::info!("API rejected customer token, signing out");
        if let Err(e) = clear_current_customer(&session).await {
            tracing::error!("Failed to clear expired customer session: {e}");
        }
    }

    response
}
