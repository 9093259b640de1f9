//! Storefront customer records.

use serde::{Deserialize, Serialize};

use super::id::CustomerId;

/// A signed-in storefront customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(alias = "_id")]
    pub id: CustomerId,
    #[serde(alias = "fullName")]
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A customer reference on an order; absent for guest orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomerRef {
    Populated(Customer),
    Id(CustomerId),
}

impl CustomerRef {
    #[must_use]
    pub const fn id(&self) -> &CustomerId {
        match self {
            Self::Populated(customer) => &customer.id,
            Self::Id(id) => id,
        }
    }
}
