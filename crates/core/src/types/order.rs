//! Orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::ProductRef;
use super::customer::CustomerRef;
use super::id::OrderId;
use super::price::Price;
use super::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// An order as returned by the order endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    pub order_code: Option<String>,
    /// `None` for guest checkouts.
    pub customer: Option<CustomerRef>,
    #[serde(default, alias = "shippingInfo")]
    pub shipping: ShippingContact,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub subtotal: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub promotion_code: Option<String>,
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Code shown to customers; falls back to the id.
    #[must_use]
    pub fn code(&self) -> &str {
        self.order_code.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Whether the order was placed without an account.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.customer.is_none()
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::of(self.total)
    }
}

/// One line of an order (or of a server cart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductRef,
    /// Name snapshot taken when the line was created.
    pub name: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Option<Decimal>,
}

impl OrderItem {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.product.name())
            .unwrap_or("Product")
    }

    /// Line total as sent by the server, else computed.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.total.map_or_else(
            || Price::of(self.price).line_total(self.quantity, self.discount),
            Price::of,
        )
    }
}

/// Delivery contact captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingContact {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_order_from_api_json() {
        let order: Order = serde_json::from_str(
            r#"{
                "_id": "o1",
                "orderCode": "SH-1001",
                "customer": null,
                "shippingInfo": {
                    "fullName": "Ada",
                    "email": "ada@example.com",
                    "phone": "555",
                    "address": "1 Loop St"
                },
                "items": [
                    {
                        "product": {"_id": "p1", "name": "Cap"},
                        "quantity": 2, "price": 10, "discount": 0, "total": 20
                    },
                    {"product": "p2", "name": "Mug", "quantity": 1, "price": 8}
                ],
                "total": 28,
                "status": "shipped",
                "paymentStatus": "paid",
                "paymentMethod": "cod"
            }"#,
        )
        .unwrap();

        assert!(order.is_guest());
        assert_eq!(order.code(), "SH-1001");
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.shipping.full_name, "Ada");
        assert_eq!(order.items[0].display_name(), "Cap");
        assert_eq!(order.items[1].display_name(), "Mug");
        assert_eq!(order.items[1].line_total().amount, Decimal::new(8, 0));
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_code_falls_back_to_id() {
        let order: Order =
            serde_json::from_str(r#"{"id":"o2","total":0}"#).unwrap();
        assert_eq!(order.code(), "o2");
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }
}
