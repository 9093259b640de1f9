//! Unified error handling with Sentry integration.
//!
//! Handlers that render a page on their own catch [`ApiError`]s and show them
//! as a dialog. Everything else returns `Result<T, AppError>`; server-side
//! failures are captured to Sentry before responding and never leak details.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use storehouse_core::Notice;
use thiserror::Error;

use crate::api::ApiError;
use crate::middleware::SessionExpired;

/// Application-level error type for the storefront.
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

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Full-page error dialog.
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
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::NotFound(_) => "We couldn't find that page.".to_string(),
            Self::BadRequest(message) => message.clone(),
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

        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Session(_)
                | Self::Internal(_)
                | Self::Api(ApiError::Status(_) | ApiError::Transport(_) | ApiError::Decode(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
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

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
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
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Business("No stock".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Status(500))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_redirects_and_marks_session() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
