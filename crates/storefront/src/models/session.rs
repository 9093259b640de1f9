//! Session-related types.
//!
//! The session holds the signed-in customer (with the API bearer token), the
//! order-tracking step and a one-shot notice carried across redirects. The
//! guest cart is not here: it lives in its own cookie.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use storehouse_core::{Customer, CustomerId};

/// Session-stored customer identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    token: String,
}

impl CurrentCustomer {
    #[must_use]
    pub fn new(customer: Customer, token: &SecretString) -> Self {
        use secrecy::ExposeSecret;

        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            token: token.expose_secret().to_string(),
        }
    }

    /// Bearer token for API calls made on the customer's behalf.
    #[must_use]
    pub fn token(&self) -> SecretString {
        SecretString::from(self.token.clone())
    }
}

impl fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// The signed-in customer and their token.
    pub const TOKEN_USER: &str = "tokenUser";

    /// Current step of the order-tracking lookup.
    pub const TRACKING: &str = "tracking";

    /// Notice to show on the next rendered page.
    pub const NOTICE: &str = "notice";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let customer = Customer {
            id: CustomerId::new("u1"),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            address: None,
        };
        let current = CurrentCustomer::new(customer, &SecretString::from("tok-123"));
        let debug = format!("{current:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tok-123"));
    }
}
