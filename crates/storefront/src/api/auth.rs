//! Customer sign-in and sign-up.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use storehouse_core::Customer;
use storehouse_core::validation::{RegisterDraft, password};
use tracing::instrument;

use super::{ApiError, StorefrontApi, required};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    #[serde(serialize_with = "password::serialize")]
    password: &'a SecretString,
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(alias = "accessToken")]
    token: String,
    #[serde(alias = "customer")]
    user: Customer,
}

/// Payload of a successful customer sign-in.
#[derive(Debug)]
pub struct LoginResponse {
    pub token: SecretString,
    pub user: Customer,
}

impl StorefrontApi {
    /// `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let data: Option<LoginPayload> = self.post("/api/auth/login", &body, None).await?;
        let payload = required(data, "sign-in result")?;
        Ok(LoginResponse {
            token: SecretString::from(payload.token),
            user: payload.user,
        })
    }

    /// `POST /api/auth/register`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] when the e-mail is taken.
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn register(&self, draft: &RegisterDraft) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.post("/api/auth/register", draft, None).await?;
        Ok(())
    }
}
