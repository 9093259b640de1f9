//! Checkout, order history and OTP-gated order tracking.

use secrecy::SecretString;
use serde::Serialize;
use storehouse_core::tracking::OtpSubmission;
use storehouse_core::validation::CheckoutDraft;
use storehouse_core::{Email, Order, OrderId, ProductId};
use tracing::instrument;

use super::{ApiError, Listing, StorefrontApi, required};

/// One cart line sent with a guest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/order`.
///
/// Signed-in customers order their server cart, so `items` is only filled
/// for guests.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrder {
    #[serde(flatten)]
    pub checkout: CheckoutDraft,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderLine>,
}

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a Email,
}

impl StorefrontApi {
    /// `POST /api/order`, bearer optional.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the order is rejected or the request fails.
    #[instrument(skip(self, token, order), fields(items = order.items.len()))]
    pub async fn place_order(
        &self,
        token: Option<&SecretString>,
        order: &PlaceOrder,
    ) -> Result<Order, ApiError> {
        let data = self.post("/api/order", order, token).await?;
        required(data, "order")
    }

    /// `GET /api/order/my`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let listing: Option<Listing<Order>> = self.get("/api/order/my", &[], Some(token)).await?;
        Ok(listing.map(|l| l.into_page().items).unwrap_or_default())
    }

    /// `GET /api/order/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the order is missing.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &SecretString, id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("/api/order/{}", urlencoding::encode(id.as_str()));
        let data = self.get(&path, &[], Some(token)).await?;
        required(data, "order")
    }

    /// `POST /api/order/tracking/otp {email}`: the server emails a code.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request is rejected.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_tracking_otp(&self, email: &Email) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .post("/api/order/tracking/otp", &OtpRequest { email }, None)
            .await?;
        Ok(())
    }

    /// `POST /api/order/tracking {email, otp}`: orders for the e-mail.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] for a wrong or expired code.
    #[instrument(skip(self, submission), fields(email = %submission.email))]
    pub async fn track_orders(&self, submission: &OtpSubmission) -> Result<Vec<Order>, ApiError> {
        let listing: Option<Listing<Order>> =
            self.post("/api/order/tracking", submission, None).await?;
        Ok(listing.map(|l| l.into_page().items).unwrap_or_default())
    }
}
