//! Back-office access control records: roles, permissions, admin accounts.

use serde::{Deserialize, Serialize};

use super::id::{AdminAccountId, RoleId};
use super::status::{AccountStatus, ActiveStatus};

/// Back-office area a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Product,
    Category,
    Order,
    Promotion,
    Role,
    Account,
}

wire_enum!(Module {
    Product => ("product", "Products"),
    Category => ("category", "Categories"),
    Order => ("order", "Orders"),
    Promotion => ("promotion", "Promotions"),
    Role => ("role", "Roles"),
    Account => ("account", "Accounts"),
});

/// Action within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Create,
    Update,
    Delete,
}

wire_enum!(Capability {
    View => ("view", "View"),
    Create => ("create", "Create"),
    Update => ("update", "Update"),
    Delete => ("delete", "Delete"),
});

/// Capabilities granted on one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub module: Module,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Whether `permissions` grant `capability` on `module`.
#[must_use]
pub fn permits(permissions: &[Permission], module: Module, capability: Capability) -> bool {
    permissions
        .iter()
        .any(|p| p.module == module && p.capabilities.contains(&capability))
}

/// A back-office role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(alias = "_id")]
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ActiveStatus,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    #[must_use]
    pub fn allows(&self, module: Module, capability: Capability) -> bool {
        permits(&self.permissions, module, capability)
    }

    /// Set of `module:capability` keys, as used by the role form checkboxes.
    #[must_use]
    pub fn permission_keys(&self) -> Vec<String> {
        self.permissions
            .iter()
            .flat_map(|p| p.capabilities.iter().map(move |c| format!("{}:{}", p.module, c)))
            .collect()
    }
}

/// A role reference that the server may or may not populate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Populated {
        #[serde(alias = "_id")]
        id: RoleId,
        name: String,
    },
    Id(RoleId),
}

impl RoleRef {
    #[must_use]
    pub const fn id(&self) -> &RoleId {
        match self {
            Self::Populated { id, .. } | Self::Id(id) => id,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Populated { name, .. } => Some(name),
            Self::Id(_) => None,
        }
    }
}

/// A back-office account. The password is never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    #[serde(alias = "_id")]
    pub id: AdminAccountId,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub email: Option<String>,
    pub role: Option<RoleRef>,
    #[serde(default)]
    pub status: AccountStatus,
}

/// The signed-in admin as returned by the login endpoint.
///
/// The admin panel caches this in the session and stamps its id on every
/// write request as the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(alias = "_id")]
    pub id: AdminAccountId,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub role_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl AdminProfile {
    #[must_use]
    pub fn allows(&self, module: Module, capability: Capability) -> bool {
        permits(&self.permissions, module, capability)
    }

    /// Name shown in the header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions_from_api_json() {
        let role: Role = serde_json::from_str(
            r#"{
                "_id": "r1",
                "name": "Catalog editor",
                "permissions": [
                    {"module": "product", "capabilities": ["view", "create", "update"]},
                    {"module": "category", "capabilities": ["view"]}
                ]
            }"#,
        )
        .unwrap();

        assert!(role.allows(Module::Product, Capability::Update));
        assert!(!role.allows(Module::Product, Capability::Delete));
        assert!(!role.allows(Module::Order, Capability::View));
        assert!(role.permission_keys().contains(&"category:view".to_string()));
    }

    #[test]
    fn test_account_role_ref() {
        let account: AdminAccount = serde_json::from_str(
            r#"{"_id":"a1","username":"ops","role":{"_id":"r1","name":"Ops"},"status":"locked"}"#,
        )
        .unwrap();
        assert_eq!(account.role.as_ref().and_then(RoleRef::name), Some("Ops"));
        assert_eq!(account.status, AccountStatus::Locked);
    }

    #[test]
    fn test_profile_display_name() {
        let profile = AdminProfile {
            id: AdminAccountId::new("a1"),
            username: "ops".to_string(),
            full_name: " ".to_string(),
            role_name: None,
            permissions: vec![],
        };
        assert_eq!(profile.display_name(), "ops");
    }
}
