//! Session-related types for admin authentication.
//!
//! Sign-in stores two entries: the bearer token under `tokenAdmin` and the
//! admin identity (name, role and permissions) under `adminData`. A session
//! is signed in only when both are present.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use storehouse_core::{AdminProfile, Capability, Module};

use crate::api::Credentials;

/// The signed-in admin.
#[derive(Clone)]
pub struct CurrentAdmin {
    pub profile: AdminProfile,
    token: SecretString,
}

impl CurrentAdmin {
    #[must_use]
    pub const fn new(profile: AdminProfile, token: SecretString) -> Self {
        Self { profile, token }
    }

    /// Token and actor id for API calls made by this admin.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.profile.id.clone())
    }

    /// Raw token, for storing in the session.
    #[must_use]
    pub fn token_value(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub fn can(&self, module: Module, capability: Capability) -> bool {
        self.profile.allows(module, capability)
    }
}

impl fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("id", &self.profile.id)
            .field("username", &self.profile.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Bearer token from the admin login.
    pub const TOKEN_ADMIN: &str = "tokenAdmin";

    /// Cached [`AdminProfile`](storehouse_core::AdminProfile).
    pub const ADMIN_DATA: &str = "adminData";

    /// Notice to show on the next rendered page.
    pub const NOTICE: &str = "notice";
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehouse_core::{AdminAccountId, Permission};

    fn admin() -> CurrentAdmin {
        CurrentAdmin::new(
            AdminProfile {
                id: AdminAccountId::new("a1"),
                username: "ops".to_string(),
                full_name: "Ops Lead".to_string(),
                role_name: Some("Operations".to_string()),
                permissions: vec![Permission {
                    module: Module::Order,
                    capabilities: vec![Capability::View, Capability::Update],
                }],
            },
            SecretString::from("tok-1"),
        )
    }

    #[test]
    fn test_permissions() {
        let admin = admin();
        assert!(admin.can(Module::Order, Capability::Update));
        assert!(!admin.can(Module::Order, Capability::Delete));
        assert!(!admin.can(Module::Product, Capability::View));
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", admin());
        assert!(!debug.contains("tok-1"));
        assert_eq!(admin().credentials().actor().as_str(), "a1");
    }
}
