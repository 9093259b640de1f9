//! Status enums for the API records.
//!
//! Every enum serializes to the lowercase wire value the API uses and
//! round-trips through `Display`/`FromStr`, which is how HTML forms post them.

use serde::{Deserialize, Serialize};

/// Product visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Draft,
}

wire_enum!(ProductStatus {
    Active => ("active", "Active"),
    Inactive => ("inactive", "Inactive"),
    Draft => ("draft", "Draft"),
});

/// On/off status shared by categories, roles and promotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

wire_enum!(ActiveStatus {
    Active => ("active", "Active"),
    Inactive => ("inactive", "Inactive"),
});

/// Admin account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Locked,
}

wire_enum!(AccountStatus {
    Active => ("active", "Active"),
    Locked => ("locked", "Locked"),
});

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

wire_enum!(OrderStatus {
    Pending => ("pending", "Pending"),
    Confirmed => ("confirmed", "Confirmed"),
    Shipped => ("shipped", "Shipped"),
    Delivered => ("delivered", "Delivered"),
    Cancelled => ("cancelled", "Cancelled"),
});

/// One step of an order's status timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineStep {
    pub status: OrderStatus,
    pub reached: bool,
    pub current: bool,
}

impl OrderStatus {
    /// The regular fulfillment path, in order.
    pub const PATH: [Self; 4] = [Self::Pending, Self::Confirmed, Self::Shipped, Self::Delivered];

    /// Whether no further status changes are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Timeline shown on tracking pages.
    ///
    /// A cancelled order shows only the pending step followed by the
    /// cancellation marker.
    #[must_use]
    pub fn timeline(self) -> Vec<TimelineStep> {
        if self == Self::Cancelled {
            return vec![
                TimelineStep {
                    status: Self::Pending,
                    reached: true,
                    current: false,
                },
                TimelineStep {
                    status: Self::Cancelled,
                    reached: true,
                    current: true,
                },
            ];
        }

        let position = Self::PATH.iter().position(|s| *s == self).unwrap_or(0);
        Self::PATH
            .iter()
            .enumerate()
            .map(|(i, status)| TimelineStep {
                status: *status,
                reached: i <= position,
                current: i == position,
            })
            .collect()
    }
}

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Unpaid,
    Refunded,
    Failed,
}

wire_enum!(PaymentStatus {
    Pending => ("pending", "Pending"),
    Paid => ("paid", "Paid"),
    Unpaid => ("unpaid", "Unpaid"),
    Refunded => ("refunded", "Refunded"),
    Failed => ("failed", "Failed"),
});

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cod,
    BankTransfer,
    Card,
}

wire_enum!(PaymentMethod {
    Cod => ("cod", "Cash on delivery"),
    BankTransfer => ("bank_transfer", "Bank transfer"),
    Card => ("card", "Card"),
});

/// How a promotion reduces the order value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percent,
    Amount,
}

wire_enum!(DiscountType {
    Percent => ("percent", "Percentage"),
    Amount => ("amount", "Fixed amount"),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap_or_default(),
            "\"bank_transfer\""
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!("refunded".parse::<PaymentStatus>(), Ok(PaymentStatus::Refunded));
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_timeline_marks_reached_steps() {
        let steps = OrderStatus::Shipped.timeline();
        assert_eq!(steps.len(), 4);
        let reached: Vec<bool> = steps.iter().map(|s| s.reached).collect();
        assert_eq!(reached, vec![true, true, true, false]);
        assert!(steps.iter().any(|s| s.current && s.status == OrderStatus::Shipped));
    }

    #[test]
    fn test_timeline_cancelled() {
        let steps = OrderStatus::Cancelled.timeline();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps.last().map(|s| s.status), Some(OrderStatus::Cancelled));
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
    }
}
