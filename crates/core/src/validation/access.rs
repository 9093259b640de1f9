//! Role and admin-account forms.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ValidationErrors, choice, optional_text, password, required_text};
use crate::types::{
    AccountStatus, ActiveStatus, Capability, Email, Module, Permission, RoleId,
};

/// Posted role form.
///
/// Permission checkboxes all share the `permissions` name with a
/// `module:capability` value, so the form is collected from raw pairs.
#[derive(Debug, Clone, Default)]
pub struct RoleForm {
    pub name: String,
    pub description: String,
    pub status: String,
    pub permissions: Vec<String>,
}

/// Role create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDraft {
    pub name: String,
    pub description: String,
    pub status: ActiveStatus,
    pub permissions: Vec<Permission>,
}

impl RoleForm {
    pub const NAME_MAX: usize = 50;
    pub const DESCRIPTION_MAX: usize = 500;

    /// Collect the form from url-encoded pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value,
                "description" => form.description = value,
                "status" => form.status = value,
                "permissions" => form.permissions.push(value),
                _ => {}
            }
        }
        form
    }

    /// # Errors
    ///
    /// Returns every field problem found, including unknown permission keys.
    pub fn validate(&self) -> Result<RoleDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", "Name", &self.name, Self::NAME_MAX);
        let description = optional_text(
            &mut errors,
            "description",
            "Description",
            &self.description,
            Self::DESCRIPTION_MAX,
        );
        let status = choice(&mut errors, "status", "Status", &self.status);

        let mut grants: BTreeMap<Module, Vec<Capability>> = BTreeMap::new();
        for key in &self.permissions {
            let parsed = key.split_once(':').and_then(|(module, capability)| {
                Some((
                    module.parse::<Module>().ok()?,
                    capability.parse::<Capability>().ok()?,
                ))
            });
            match parsed {
                Some((module, capability)) => {
                    let capabilities = grants.entry(module).or_default();
                    if !capabilities.contains(&capability) {
                        capabilities.push(capability);
                    }
                }
                None => errors.add("permissions", format!("Unknown permission {key}")),
            }
        }
        if grants.is_empty() && !errors.has("permissions") {
            errors.add("permissions", "Select at least one permission");
        }

        let permissions = grants
            .into_iter()
            .map(|(module, mut capabilities)| {
                capabilities.sort();
                Permission {
                    module,
                    capabilities,
                }
            })
            .collect();

        errors.finish(RoleDraft {
            name,
            description,
            status,
            permissions,
        })
    }
}

/// Posted admin account form.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub username: String,
    #[serde(deserialize_with = "password::deserialize")]
    pub password: SecretString,
    pub full_name: String,
    pub email: String,
    pub role_id: String,
    pub status: String,
}

impl Default for AccountForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: password::blank(),
            full_name: String::new(),
            email: String::new(),
            role_id: String::new(),
            status: String::new(),
        }
    }
}

/// Admin account create/update body.
///
/// `password` is omitted on update when left blank, which keeps the
/// current one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    pub username: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "password::serialize_optional"
    )]
    pub password: Option<SecretString>,
    pub full_name: String,
    pub email: Email,
    pub role: RoleId,
    pub status: AccountStatus,
}

impl AccountForm {
    pub const USERNAME_MIN: usize = 3;
    pub const USERNAME_MAX: usize = 50;
    pub const FULL_NAME_MAX: usize = 100;
    pub const PASSWORD_MIN: usize = 6;

    /// Validate for create (`is_create`) or update.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self, is_create: bool) -> Result<AccountDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = required_text(
            &mut errors,
            "username",
            "Username",
            &self.username,
            Self::USERNAME_MAX,
        );
        if !username.is_empty() && username.chars().count() < Self::USERNAME_MIN {
            errors.add(
                "username",
                format!("Username must be at least {} characters", Self::USERNAME_MIN),
            );
        }

        let full_name = required_text(
            &mut errors,
            "full_name",
            "Full name",
            &self.full_name,
            Self::FULL_NAME_MAX,
        );

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", format!("Email: {e}"));
                None
            }
        };

        let secret = self.password.expose_secret();
        let password = if secret.is_empty() {
            if is_create {
                errors.add("password", "Password is required");
            }
            None
        } else {
            if secret.chars().count() < Self::PASSWORD_MIN {
                errors.add(
                    "password",
                    format!("Password must be at least {} characters", Self::PASSWORD_MIN),
                );
            }
            Some(self.password.clone())
        };

        let role_id = self.role_id.trim();
        if role_id.is_empty() {
            errors.add("role_id", "Role is required");
        }

        let status = choice(&mut errors, "status", "Status", &self.status);

        match email {
            Some(email) if errors.is_empty() => Ok(AccountDraft {
                username,
                password,
                full_name,
                email,
                role: RoleId::new(role_id),
                status,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_role_groups_permissions_by_module() {
        let form = RoleForm::from_pairs(pairs(&[
            ("name", "Stock keeper"),
            ("permissions", "product:update"),
            ("permissions", "order:view"),
            ("permissions", "product:view"),
            ("permissions", "product:view"),
        ]));
        let draft = form.validate().unwrap();
        assert_eq!(
            draft.permissions,
            vec![
                Permission {
                    module: Module::Product,
                    capabilities: vec![Capability::View, Capability::Update],
                },
                Permission {
                    module: Module::Order,
                    capabilities: vec![Capability::View],
                },
            ]
        );
    }

    #[test]
    fn test_role_needs_a_permission() {
        let form = RoleForm::from_pairs(pairs(&[("name", "Empty")]));
        assert_eq!(
            form.validate().unwrap_err().get("permissions"),
            Some("Select at least one permission")
        );
    }

    #[test]
    fn test_role_rejects_unknown_key() {
        let form = RoleForm::from_pairs(pairs(&[("name", "X"), ("permissions", "blog:view")]));
        assert!(form.validate().unwrap_err().has("permissions"));
    }

    fn account_form() -> AccountForm {
        AccountForm {
            username: "jdoe".to_string(),
            password: SecretString::from("secret1".to_string()),
            full_name: "Jane Doe".to_string(),
            email: "Jane@Example.com".to_string(),
            role_id: "r1".to_string(),
            status: String::new(),
        }
    }

    #[test]
    fn test_account_create() {
        let draft = account_form().validate(true).unwrap();
        assert_eq!(draft.email.as_str(), "jane@example.com");
        assert_eq!(
            draft.password.as_ref().map(ExposeSecret::expose_secret),
            Some("secret1")
        );
        assert_eq!(draft.status, AccountStatus::Active);
    }

    #[test]
    fn test_account_password_rules() {
        let mut form = account_form();
        form.password = password::blank();
        assert!(form.validate(true).unwrap_err().has("password"));
        assert!(form.validate(false).unwrap().password.is_none());

        form.password = SecretString::from("123".to_string());
        assert!(form.validate(false).unwrap_err().has("password"));
    }

    #[test]
    fn test_account_field_checks() {
        let form = AccountForm {
            username: "jd".to_string(),
            email: "nope".to_string(),
            ..account_form()
        };
        let errors = form.validate(true).unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));
    }

    #[test]
    fn test_password_is_redacted() {
        let draft = account_form().validate(true).unwrap();
        let debug = format!("{draft:?} {:?}", account_form());
        assert!(!debug.contains("secret1"));
        assert_eq!(serde_json::to_value(&draft).unwrap()["password"], "secret1");
    }

    #[test]
    fn test_blank_password_not_serialized() {
        let mut form = account_form();
        form.password = password::blank();
        let json = serde_json::to_value(form.validate(false).unwrap()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["fullName"], "Jane Doe");
        assert_eq!(json["role"], "r1");
    }
}
