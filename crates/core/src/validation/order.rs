//! Order status changes from the back-office.

/// The status to send, or `None` when `requested` is already `current`.
///
/// Selecting the status an order already has must not hit the API.
#[must_use]
pub fn status_change<T: PartialEq>(current: T, requested: T) -> Option<T> {
    (current != requested).then_some(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderStatus, PaymentStatus};

    #[test]
    fn test_same_status_is_no_change() {
        assert_eq!(status_change(OrderStatus::Shipped, OrderStatus::Shipped), None);
        assert_eq!(
            status_change(OrderStatus::Pending, OrderStatus::Confirmed),
            Some(OrderStatus::Confirmed)
        );
        assert_eq!(status_change(PaymentStatus::Paid, PaymentStatus::Paid), None);
    }
}
