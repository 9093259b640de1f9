//! Unified error handling for admin.
//!
//! Form handlers catch business failures themselves and re-render the form
//! with a dialog. Anything that escapes becomes a full error page; server
//! failures are captured to Sentry and their details are never shown.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use storehouse_core::Notice;
use thiserror::Error;

use crate::api::ApiError;
use crate::middleware::SessionExpired;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// REST API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    notice: Notice,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::Business(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Api(ApiError::Forbidden) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Api(ApiError::Status(404)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Status(404)) | Self::NotFound(_) => {
                "That record does not exist or was deleted.".to_string()
            }
            Self::Api(err) => err.user_message(),
            Self::Forbidden(message) | Self::BadRequest(message) => message.clone(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Api(ApiError::Unauthorized) = self {
            let mut response = Redirect::to("/auth/login").into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        // Log server errors with Sentry
        if matches!(
            self,
            Self::Session(_)
                | Self::Internal(_)
                | Self::Api(ApiError::Transport(_) | ApiError::Decode(_))
        ) || matches!(self, Self::Api(ApiError::Status(code)) if code >= 500)
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();
        let template = ErrorTemplate {
            status: status.as_u16(),
            notice: Notice::error(self.user_message()),
        };

        let body = template.render().unwrap_or_else(|e| {
            tracing::error!("Template render error: {}", e);
            "Internal Server Error".to_string()
        });
        (status, Html(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Turn a failed write into the dialog shown over the re-rendered form.
///
/// An expired token is not a form problem: it escapes so the session is
/// cleared and the admin is sent to sign in.
///
/// # Errors
///
/// Returns [`AppError::Api`] for [`ApiError::Unauthorized`].
pub fn failure_notice(err: ApiError) -> Result<Notice> {
    match err {
        ApiError::Unauthorized => Err(AppError::Api(err)),
        ApiError::Business(_) | ApiError::Forbidden => {
            tracing::info!(error = %err, "API rejected admin write");
            Ok(Notice::error(err.user_message()))
        }
        ApiError::Status(_) | ApiError::Transport(_) | ApiError::Decode(_) => {
            tracing::warn!(error = %err, "Admin write failed");
            Ok(Notice::error(err.user_message()))
        }
    }
}

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(admin_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Status(404))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Status(503))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_failure_notice() {
        let notice = failure_notice(ApiError::Business("Code already exists".to_string()));
        assert!(matches!(notice, Ok(ref n) if n.message == "Code already exists"));

        let notice = failure_notice(ApiError::Status(500));
        assert!(matches!(notice, Ok(ref n) if n.message == crate::api::GENERIC_FAILURE));

        assert!(matches!(
            failure_notice(ApiError::Unauthorized),
            Err(AppError::Api(ApiError::Unauthorized))
        ));
    }

    #[test]
    fn test_unauthorized_redirects_and_marks_session() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
