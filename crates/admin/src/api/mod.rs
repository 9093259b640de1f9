//! Client for the `/admin/*` endpoints of the REST API.
//!
//! Every call after sign-in carries the admin's bearer token, and every write
//! is stamped with the acting admin's id (`createdBy` on create, `updatedBy`
//! on update). Responses are unwrapped from the shared [`ApiEnvelope`].
//!
//! # Example
//!
//! ```rust,ignore
//! let api = AdminApi::new(&config.api)?;
//! let signed_in = api.login("ops", "hunter22").await?;
//! let creds = Credentials::new(signed_in.token, signed_in.profile.id.clone());
//! let roles = api.list_roles(&creds).await?;
//! ```

mod access;
mod auth;
mod catalog;
mod orders;
mod promotions;

pub use auth::AdminLogin;
pub use catalog::{ImageUpload, ProductListQuery};
pub use orders::OrderListQuery;

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storehouse_core::{AdminAccountId, ApiBaseUrl, ApiEnvelope, Page};
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

    /// The admin token was missing, invalid or expired.
    #[error("session expired or not authorized")]
    Unauthorized,

    /// The token is valid but the role lacks the permission.
    #[error("forbidden")]
    Forbidden,

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
            Self::Forbidden => "You do not have permission to do that.".to_string(),
            Self::Status(_) | Self::Transport(_) | Self::Decode(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Bearer token plus the id stamped on writes.
#[derive(Clone)]
pub struct Credentials {
    token: SecretString,
    actor: AdminAccountId,
}

impl Credentials {
    #[must_use]
    pub const fn new(token: SecretString, actor: AdminAccountId) -> Self {
        Self { token, actor }
    }

    #[must_use]
    pub const fn actor(&self) -> &AdminAccountId {
        &self.actor
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("actor", &self.actor)
            .finish()
    }
}

/// A write body with the acting admin attached.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Stamped<'a, B: Serialize> {
    #[serde(flatten)]
    body: &'a B,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_by: Option<&'a AdminAccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_by: Option<&'a AdminAccountId>,
}

impl<'a, B: Serialize> Stamped<'a, B> {
    pub(crate) const fn created(body: &'a B, creds: &'a Credentials) -> Self {
        Self {
            body,
            created_by: Some(&creds.actor),
            updated_by: None,
        }
    }

    pub(crate) const fn updated(body: &'a B, creds: &'a Credentials) -> Self {
        Self {
            body,
            created_by: None,
            updated_by: Some(&creds.actor),
        }
    }
}

/// Admin API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct AdminApi {
    inner: Arc<AdminApiInner>,
}

struct AdminApiInner {
    client: reqwest::Client,
    base_url: ApiBaseUrl,
}

impl AdminApi {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("storehouse-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminApiInner {
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
        creds: Option<&Credentials>,
    ) -> reqwest::RequestBuilder {
        let url = self.inner.base_url.endpoint(path);
        let builder = self.inner.client.request(method, url);
        match creds {
            Some(creds) => builder.bearer_auth(creds.token.expose_secret()),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        creds: &Credentials,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, path, Some(creds))
            .query(query)
            .send()
            .await?;
        handle_response(response, true).await
    }

    /// Send a JSON body with `method`.
    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
        creds: Option<&Credentials>,
    ) -> Result<Option<T>, ApiError> {
        let response = self.request(method, path, creds).json(body).send().await?;
        handle_response(response, creds.is_some()).await
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        form: reqwest::multipart::Form,
        creds: &Credentials,
    ) -> Result<Option<T>, ApiError> {
        let response = self
            .request(method, path, Some(creds))
            .multipart(form)
            .send()
            .await?;
        handle_response(response, true).await
    }

    async fn delete(&self, path: &str, creds: &Credentials) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::DELETE, path, Some(creds))
            .send()
            .await?;
        let _: Option<serde_json::Value> = handle_response(response, true).await?;
        Ok(())
    }
}

/// Turn a response into the envelope payload or an [`ApiError`].
///
/// 401 and 403 on authenticated calls map to their own variants; on the
/// anonymous sign-in call the envelope message is used instead.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    authenticated: bool,
) -> Result<Option<T>, ApiError> {
    let status = response.status();
    if authenticated {
        match status {
            StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => return Err(ApiError::Forbidden),
            _ => {}
        }
    }

    let body = response.text().await?;
    parse_envelope(status, &body)
}

/// Interpret a response body.
pub(crate) fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ApiError> {
    if status.is_success() && body.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) if envelope.success && !status.is_success() => {
            Err(ApiError::Status(status.as_u16()))
        }
        Ok(envelope) => envelope.into_result().map_err(ApiError::Business),
        Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
        Err(_) => match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
            Ok(envelope) if !envelope.success => Err(envelope
                .into_result()
                .map_or_else(ApiError::Business, |_| ApiError::Status(status.as_u16()))),
            _ => Err(ApiError::Status(status.as_u16())),
        },
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

    pub(crate) fn page_or_empty(listing: Option<Self>) -> Page<T> {
        listing.map_or_else(|| Page::single(Vec::new()), Self::into_page)
    }
}

fn required<T>(data: Option<T>, what: &str) -> Result<T, ApiError> {
    data.ok_or_else(|| ApiError::Decode(format!("response has no {what}")))
}

/// `/admin/<resource>/<id>` with the id escaped.
fn item_path(collection: &str, id: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use storehouse_core::validation::CategoryForm;

    #[test]
    fn test_stamped_body_flattens_actor() {
        let draft = CategoryForm {
            name: "Shoes".to_string(),
            ..CategoryForm::default()
        }
        .validate()
        .unwrap();
        let creds = Credentials::new(SecretString::from("t"), AdminAccountId::new("a1"));

        let created = serde_json::to_value(Stamped::created(&draft, &creds)).unwrap();
        assert_eq!(created["name"], "Shoes");
        assert_eq!(created["createdBy"], "a1");
        assert!(created.get("updatedBy").is_none());

        let updated = serde_json::to_value(Stamped::updated(&draft, &creds)).unwrap();
        assert_eq!(updated["updatedBy"], "a1");
        assert!(updated.get("createdBy").is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::new(SecretString::from("tok-9"), AdminAccountId::new("a1"));
        let debug = format!("{creds:?}");
        assert!(!debug.contains("tok-9"));
        assert!(debug.contains("a1"));
    }

    #[test]
    fn test_parse_envelope_variants() {
        let ok: Option<serde_json::Value> =
            parse_envelope(StatusCode::OK, r#"{"success":true,"data":{"x":1}}"#).unwrap();
        assert!(ok.is_some());

        let empty: Option<serde_json::Value> = parse_envelope(StatusCode::NO_CONTENT, "").unwrap();
        assert!(empty.is_none());

        let err = parse_envelope::<serde_json::Value>(
            StatusCode::CONFLICT,
            r#"{"success":false,"message":"Code already exists"}"#,
        )
        .unwrap_err();
        assert_eq!(err.user_message(), "Code already exists");

        let err =
            parse_envelope::<serde_json::Value>(StatusCode::NOT_FOUND, "Not Found").unwrap_err();
        assert!(matches!(err, ApiError::Status(404)));
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_item_path_escapes_id() {
        assert_eq!(item_path("/admin/role", "a b"), "/admin/role/a%20b");
    }
}
