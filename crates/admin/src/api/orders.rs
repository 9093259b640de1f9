//! Order management.
//!
//! Orders are never created or deleted from the back-office; only their
//! fulfillment and payment status change.

use serde::Serialize;
use storehouse_core::{AdminAccountId, Order, OrderId, OrderStatus, Page, PaymentStatus};
use tracing::instrument;

use super::{AdminApi, ApiError, Credentials, Listing, item_path, required};

const ORDERS: &str = "/admin/order";

/// Query for the order listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    pub page: u32,
    pub status: Option<OrderStatus>,
}

impl OrderListQuery {
    pub const LIMIT: u32 = 20;

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", Self::LIMIT.to_string()),
        ];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate<'a> {
    status: OrderStatus,
    updated_by: &'a AdminAccountId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentStatusUpdate<'a> {
    payment_status: PaymentStatus,
    updated_by: &'a AdminAccountId,
}

impl AdminApi {
    /// `GET /admin/order`, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds))]
    pub async fn list_orders(
        &self,
        creds: &Credentials,
        query: &OrderListQuery,
    ) -> Result<Page<Order>, ApiError> {
        let listing: Option<Listing<Order>> = self.get(ORDERS, &query.to_params(), creds).await?;
        Ok(Listing::page_or_empty(listing))
    }

    /// `GET /admin/order/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the order is missing.
    #[instrument(skip(self, creds), fields(order_id = %id))]
    pub async fn get_order(&self, creds: &Credentials, id: &OrderId) -> Result<Order, ApiError> {
        let order = self.get(&item_path(ORDERS, id.as_str()), &[], creds).await?;
        required(order, "order")
    }

    /// `PATCH /admin/order/{id}/status {status, updatedBy}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        creds: &Credentials,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let body = StatusUpdate {
            status,
            updated_by: creds.actor(),
        };
        let path = format!("{}/status", item_path(ORDERS, id.as_str()));
        let _: Option<serde_json::Value> = self
            .send_json(reqwest::Method::PATCH, &path, &body, Some(creds))
            .await?;
        Ok(())
    }

    /// `PATCH /admin/order/{id}/payment-status {paymentStatus, updatedBy}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(order_id = %id, payment_status = %payment_status))]
    pub async fn update_payment_status(
        &self,
        creds: &Credentials,
        id: &OrderId,
        payment_status: PaymentStatus,
    ) -> Result<(), ApiError> {
        let body = PaymentStatusUpdate {
            payment_status,
            updated_by: creds.actor(),
        };
        let path = format!("{}/payment-status", item_path(ORDERS, id.as_str()));
        let _: Option<serde_json::Value> = self
            .send_json(reqwest::Method::PATCH, &path, &body, Some(creds))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_param() {
        let query = OrderListQuery {
            page: 0,
            status: Some(OrderStatus::Shipped),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
                ("status", "shipped".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_bodies() {
        let actor = AdminAccountId::new("a1");
        let body = serde_json::to_value(StatusUpdate {
            status: OrderStatus::Confirmed,
            updated_by: &actor,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"status": "confirmed", "updatedBy": "a1"}));

        let body = serde_json::to_value(PaymentStatusUpdate {
            payment_status: PaymentStatus::Refunded,
            updated_by: &actor,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"paymentStatus": "refunded", "updatedBy": "a1"})
        );
    }
}
