//! Client for the public `/api/*` endpoints of the REST API.
//!
//! Every response is wrapped in an [`ApiEnvelope`]. A `success: false`
//! envelope is a business failure whose message is shown to the customer;
//! anything else that goes wrong is reported with a generic message.
//!
//! # Example
//!
//! ```rust,ignore
//! let api = StorefrontApi::new(&config.api)?;
//! let page = api.list_products(&ProductQuery::default()).await?;
//! let cart = api.get_cart(&token).await?;
//! ```

mod auth;
mod cart;
mod catalog;
mod orders;

pub use auth::LoginResponse;
pub use catalog::ProductQuery;
pub use orders::{OrderLine, PlaceOrder};

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storehouse_core::{ApiBaseUrl, ApiEnvelope, Page};
use thiserror::Error;

use crate::config::ApiConfig;

/// Message shown when the failure is not a business rejection.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when calling the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the request with a message for the user.
    #[error("{0}")]
    Business(String),

    /// The bearer token was missing, invalid or expired.
    #[error("session expired or not authorized")]
    Unauthorized,

    /// Non-2xx response without an envelope.
    #[error("API returned HTTP {0}")]
    Status(u16),

    /// The request never completed.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not the expected JSON.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message safe to show in a dialog.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Business(message) => message.clone(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Status(_) | Self::Transport(_) | Self::Decode(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Storefront API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct StorefrontApi {
    inner: Arc<StorefrontApiInner>,
}

struct StorefrontApiInner {
    client: reqwest::Client,
    base_url: ApiBaseUrl,
}

impl StorefrontApi {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("storehouse-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(StorefrontApiInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The API base URL, used to resolve relative image paths.
    #[must_use]
    pub fn base_url(&self) -> &ApiBaseUrl {
        &self.inner.base_url
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> reqwest::RequestBuilder {
        let url = self.inner.base_url.endpoint(path);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// GET returning the envelope payload.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&SecretString>,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, path, token)
            .query(query)
            .send()
            .await?;
        handle_response(response, token.is_some()).await
    }

    /// POST a JSON body, returning the envelope payload.
    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .request(reqwest::Method::POST, path, token)
            .json(body)
            .send()
            .await?;
        handle_response(response, token.is_some()).await
    }
}

/// Turn a response into the envelope payload or an [`ApiError`].
///
/// A 401 on an authenticated call is always [`ApiError::Unauthorized`]; on an
/// anonymous call (sign-in) the envelope message is used instead.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    authenticated: bool,
) -> Result<Option<T>, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED && authenticated {
        return Err(ApiError::Unauthorized);
    }

    let body = response.text().await?;
    parse_envelope(status, &body)
}

/// Interpret a response body.
pub(crate) fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ApiError> {
    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) if envelope.success && !status.is_success() => {
            Err(ApiError::Status(status.as_u16()))
        }
        Ok(envelope) => envelope.into_result().map_err(ApiError::Business),
        Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
        Err(_) => {
            // A failure envelope whose payload has an unexpected shape still
            // carries a usable message.
            match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
                Ok(envelope) if !envelope.success => {
                    Err(envelope.into_result().map_or_else(ApiError::Business, |_| {
                        ApiError::Status(status.as_u16())
                    }))
                }
                _ => Err(ApiError::Status(status.as_u16())),
            }
        }
    }
}

/// A listing payload: either a page object or a bare array.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Page(Page<T>),
    Items(Vec<T>),
}

impl<T> Listing<T> {
    pub(crate) fn into_page(self) -> Page<T> {
        match self {
            Self::Page(page) => page,
            Self::Items(items) => Page::single(items),
        }
    }
}

/// Require a payload on a successful envelope.
fn required<T>(data: Option<T>, what: &str) -> Result<T, ApiError> {
    data.ok_or_else(|| ApiError::Decode(format!("response has no {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Thing {
        name: String,
    }

    #[test]
    fn test_success_envelope() {
        let data: Option<Thing> =
            parse_envelope(StatusCode::OK, r#"{"success":true,"data":{"name":"x"}}"#)
                .unwrap_or_default();
        assert_eq!(data, Some(Thing { name: "x".to_string() }));
    }

    #[test]
    fn test_business_failure_any_status() {
        let err = parse_envelope::<Thing>(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"Out of stock"}"#,
        )
        .err();
        assert!(matches!(err, Some(ApiError::Business(ref m)) if m == "Out of stock"));

        let err = parse_envelope::<Thing>(StatusCode::OK, r#"{"success":false}"#).err();
        assert!(matches!(err, Some(ApiError::Business(_))));
    }

    #[test]
    fn test_failure_with_odd_payload_keeps_message() {
        let err = parse_envelope::<Thing>(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"success":false,"message":"Bad code","data":[1,2]}"#,
        )
        .err();
        assert!(matches!(err, Some(ApiError::Business(ref m)) if m == "Bad code"));
    }

    #[test]
    fn test_listing_accepts_both_shapes() {
        let page: Listing<Thing> =
            serde_json::from_str(r#"{"items":[{"name":"a"}],"total":7,"page":2,"limit":1}"#)
                .unwrap_or(Listing::Items(Vec::new()));
        let page = page.into_page();
        assert_eq!(page.total, 7);
        assert_eq!(page.page, 2);

        let bare: Listing<Thing> = serde_json::from_str(r#"[{"name":"a"},{"name":"b"}]"#)
            .unwrap_or(Listing::Items(Vec::new()));
        assert_eq!(bare.into_page().items.len(), 2);
    }

    #[test]
    fn test_transport_style_failures_are_generic() {
        let err = parse_envelope::<Thing>(StatusCode::BAD_GATEWAY, "<html>oops</html>").err();
        assert!(matches!(err, Some(ApiError::Status(502))));
        assert_eq!(err.map(|e| e.user_message()).as_deref(), Some(GENERIC_FAILURE));

        let err = parse_envelope::<Thing>(StatusCode::OK, "not json").err();
        assert!(matches!(err, Some(ApiError::Decode(_))));
    }
}
