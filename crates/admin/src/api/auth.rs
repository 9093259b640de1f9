//! Admin sign-in.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use storehouse_core::AdminProfile;
use storehouse_core::validation::password;
use tracing::instrument;

use super::{AdminApi, ApiError, required};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    #[serde(serialize_with = "password::serialize")]
    password: &'a SecretString,
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(alias = "accessToken")]
    token: String,
    #[serde(alias = "admin", alias = "user")]
    profile: AdminProfile,
}

/// Payload of a successful admin sign-in.
#[derive(Debug)]
pub struct AdminLogin {
    pub token: SecretString,
    pub profile: AdminProfile,
}

impl AdminApi {
    /// `POST /admin/auth/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] for wrong credentials or a locked
    /// account.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AdminLogin, ApiError> {
        let body = LoginRequest { username, password };
        let data: Option<LoginPayload> = self
            .send_json(reqwest::Method::POST, "/admin/auth/login", &body, None)
            .await?;
        let payload = required(data, "sign-in result")?;
        Ok(AdminLogin {
            token: SecretString::from(payload.token),
            profile: payload.profile,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_payload_aliases() {
        let payload: LoginPayload = serde_json::from_str(
            r#"{"accessToken":"t1","admin":{"_id":"a1","username":"ops","permissions":[]}}"#,
        )
        .unwrap();
        assert_eq!(payload.token, "t1");
        assert_eq!(payload.profile.username, "ops");
    }

    #[test]
    fn test_login_request_exposes_password_only_in_body() {
        let password = SecretString::from("hunter22".to_string());
        let body = LoginRequest {
            username: "ops",
            password: &password,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "username": "ops", "password": "hunter22" })
        );
        assert!(!format!("{password:?}").contains("hunter22"));
    }
}
