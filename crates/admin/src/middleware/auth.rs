//! Authentication middleware and extractors for admin.
//!
//! The admin token lives under `tokenAdmin` and the cached identity under
//! `adminData`. Route handlers check the cached role permissions with
//! [`require_permission`] before calling the API.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use storehouse_core::{AdminProfile, Capability, Module};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.profile.display_name())
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Read the signed-in admin from both session entries.
async fn load_admin(session: &Session) -> Option<CurrentAdmin> {
    let token: String = session
        .get(session_keys::TOKEN_ADMIN)
        .await
        .ok()
        .flatten()?;
    let profile: AdminProfile = session
        .get(session_keys::ADMIN_DATA)
        .await
        .ok()
        .flatten()?;
    Some(CurrentAdmin::new(profile, SecretString::from(token)))
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = load_admin(session)
            .await
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => load_admin(session).await,
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Store the signed-in admin.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::TOKEN_ADMIN, admin.token_value())
        .await?;
    session
        .insert(session_keys::ADMIN_DATA, &admin.profile)
        .await
}

/// Clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(session_keys::TOKEN_ADMIN).await?;
    session
        .remove::<AdminProfile>(session_keys::ADMIN_DATA)
        .await?;
    Ok(())
}

/// Check a cached permission before touching the API.
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] when the admin's role lacks `capability`
/// on `module`.
pub fn require_permission(
    admin: &CurrentAdmin,
    module: Module,
    capability: Capability,
) -> Result<(), AppError> {
    if admin.can(module, capability) {
        Ok(())
    } else {
        tracing::info!(
            admin_id = %admin.profile.id,
            module = %module,
            capability = %capability,
            "Permission denied"
        );
        Err(AppError::Forbidden(format!(
            "Your role cannot {} {}.",
            capability.label().to_lowercase(),
            module.label().to_lowercase()
        )))
    }
}

/// Response marker set when the API rejected the admin's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Drop the stored admin when a handler reports an expired token.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some() {
        tracing::info!("API rejected admin token, signing out");
        if let Err(e) = clear_current_admin(&session).await {
            tracing::error!("Failed to clear expired admin session: {e}");
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehouse_core::{AdminAccountId, Permission};

    fn admin_with(permissions: Vec<Permission>) -> CurrentAdmin {
        CurrentAdmin::new(
            AdminProfile {
                id: AdminAccountId::new("a1"),
                username: "ops".to_string(),
                full_name: String::new(),
                role_name: None,
                permissions,
            },
            SecretString::from("t"),
        )
    }

    #[test]
    fn test_require_permission() {
        let admin = admin_with(vec![Permission {
            module: Module::Promotion,
            capabilities: vec![Capability::View],
        }]);

        assert!(require_permission(&admin, Module::Promotion, Capability::View).is_ok());
        let denied = require_permission(&admin, Module::Promotion, Capability::Delete);
        assert!(matches!(
            denied,
            Err(AppError::Forbidden(ref m)) if m == "Your role cannot delete promotions."
        ));
    }
}
