//! Server-side cart of the signed-in customer.

use secrecy::SecretString;
use serde::Serialize;
use storehouse_core::ProductId;
use storehouse_core::cart::Cart;
use tracing::instrument;

use super::{ApiError, StorefrontApi};

/// Body of `POST /api/cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartLineRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

impl StorefrontApi {
    /// `GET /api/cart`. A customer without a cart gets an empty one.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        let cart: Option<Cart> = self.get("/api/cart", &[], Some(token)).await?;
        Ok(cart.unwrap_or_default())
    }

    /// `POST /api/cart {productId, quantity}`: create or replace one line.
    /// A quantity of zero removes the line.
    ///
    /// Returns the updated cart when the server sends it back.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn set_cart_line(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<Cart>, ApiError> {
        let body = CartLineRequest {
            product_id,
            quantity,
        };
        // Some deployments answer with the cart, others with a bare ack.
        let data: Option<serde_json::Value> = self.post("/api/cart", &body, Some(token)).await?;
        Ok(data.and_then(|value| serde_json::from_value::<Cart>(value).ok()))
    }
}
