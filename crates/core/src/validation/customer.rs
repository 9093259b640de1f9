//! Customer sign-in and sign-up forms.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ValidationErrors, password, required_text};
use crate::types::Email;

/// Posted sign-in form, shared by the storefront and the admin panel.
///
/// The storefront signs in by e-mail and the admin panel by username, so the
/// identifier is only checked for presence.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub identifier: String,
    #[serde(default = "password::blank", deserialize_with = "password::deserialize")]
    pub password: SecretString,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            password: password::blank(),
        }
    }
}

impl LoginForm {
    /// Trimmed identifier and raw password.
    ///
    /// # Errors
    ///
    /// Returns a problem for each blank field.
    pub fn validate(&self) -> Result<(String, SecretString), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let identifier = required_text(
            &mut errors,
            "identifier",
            "Username or email",
            &self.identifier,
            254,
        );
        if self.password.expose_secret().is_empty() {
            errors.add("password", "Password is required");
        }
        errors.finish((identifier, self.password.clone()))
    }
}

/// Posted sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "password::blank", deserialize_with = "password::deserialize")]
    pub password: SecretString,
    #[serde(default = "password::blank", deserialize_with = "password::deserialize")]
    pub confirm_password: SecretString,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            password: password::blank(),
            confirm_password: password::blank(),
        }
    }
}

/// Sign-up request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDraft {
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(serialize_with = "password::serialize")]
    pub password: SecretString,
}

impl RegisterForm {
    pub const NAME_MAX: usize = 100;
    pub const PASSWORD_MIN: usize = 6;

    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<RegisterDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", "Name", &self.name, Self::NAME_MAX);

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", format!("Email: {e}"));
                None
            }
        };

        let secret = self.password.expose_secret();
        if secret.chars().count() < Self::PASSWORD_MIN {
            errors.add(
                "password",
                format!("Password must be at least {} characters", Self::PASSWORD_MIN),
            );
        }
        if secret != self.confirm_password.expose_secret() {
            errors.add("confirm_password", "Passwords do not match");
        }

        let phone = self.phone.trim();
        match email {
            Some(email) if errors.is_empty() => Ok(RegisterDraft {
                name,
                email,
                phone: (!phone.is_empty()).then(|| phone.to_string()),
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_both_fields() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert!(errors.has("identifier"));
        assert!(errors.has("password"));

        let form = LoginForm {
            identifier: " jane@example.com ".to_string(),
            password: SecretString::from("pw".to_string()),
        };
        assert_eq!(form.validate().unwrap().0, "jane@example.com");
    }

    #[test]
    fn test_register() {
        let form = RegisterForm {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: String::new(),
            password: SecretString::from("hunter22".to_string()),
            confirm_password: SecretString::from("hunter22".to_string()),
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.phone, None);
        assert!(!format!("{draft:?} {form:?}").contains("hunter22"));
        assert_eq!(serde_json::to_value(&draft).unwrap()["password"], "hunter22");

        let mismatch = RegisterForm {
            confirm_password: SecretString::from("hunter23".to_string()),
            ..form
        };
        assert!(mismatch.validate().unwrap_err().has("confirm_password"));
    }
}
