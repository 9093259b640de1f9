//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use moka::future::Cache;
use storehouse_core::Category;

use crate::api::{ApiError, StorefrontApi};
use crate::config::StorefrontConfig;
use crate::middleware::content_security_policy;

/// How long the category navigation is cached.
const CATEGORY_TTL: Duration = Duration::from_secs(300);

const CATEGORY_KEY: &str = "categories";

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the API client and the category cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: StorefrontApi,
    categories: Cache<&'static str, Arc<Vec<Category>>>,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = StorefrontApi::new(&config.api)?;
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_TTL)
            .build();
        let csp = content_security_policy(&config.api.base_url);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                categories,
                csp,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the REST API client.
    #[must_use]
    pub fn api(&self) -> &StorefrontApi {
        &self.inner.api
    }

    /// Precomputed Content-Security-Policy header.
    #[must_use]
    pub fn csp(&self) -> &HeaderValue {
        &self.inner.csp
    }

    /// Active categories for navigation, cached for five minutes.
    ///
    /// A failed fetch is logged and yields an empty list; it is not cached.
    pub async fn categories(&self) -> Arc<Vec<Category>> {
        let api = self.inner.api.clone();
        let result = self
            .inner
            .categories
            .try_get_with(CATEGORY_KEY, async move {
                api.list_categories().await.map(Arc::new)
            })
            .await;

        result.unwrap_or_else(|e| {
            tracing::warn!("Failed to load categories: {e}");
            Arc::new(Vec::new())
        })
    }
}
