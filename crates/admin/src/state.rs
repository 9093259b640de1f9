//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::api::{AdminApi, ApiError};
use crate::config::AdminConfig;
use crate::middleware::content_security_policy;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration and the API client;
/// nothing else is shared between requests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: AdminApi,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let api = AdminApi::new(&config.api)?;
        let csp = content_security_policy(&config.api.base_url);

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, csp }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the admin API client.
    #[must_use]
    pub fn api(&self) -> &AdminApi {
        &self.inner.api
    }

    #[must_use]
    pub fn csp(&self) -> &HeaderValue {
        &self.inner.csp
    }
}
