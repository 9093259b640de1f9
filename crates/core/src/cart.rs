//! Cart state, in its two homes.
//!
//! Guests keep their cart in the browser: a JSON array, URL-encoded, stored
//! in the `cart` cookie. Signed-in customers have a server-side cart keyed by
//! their account. The two are never merged; whichever one the session reads
//! is projected into the same [`QuantityMap`] for display.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderItem, Price, ProductId};

/// Product id to quantity, the shape every cart view is driven from.
pub type QuantityMap = BTreeMap<ProductId, u32>;

/// Upper bound for a single line, applied when quantities accumulate.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Largest unit price a cookie snapshot may carry. Anything above it, or
/// below zero, is shown as zero until the product is added again.
pub const MAX_SNAPSHOT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Errors decoding the guest cart cookie.
#[derive(Debug, thiserror::Error)]
pub enum GuestCartError {
    #[error("cart cookie is not valid UTF-8 after URL decoding: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("cart cookie is not a JSON cart: {0}")]
    Json(#[from] serde_json::Error),
}

/// The signed-in customer's server-side cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Option<Decimal>,
}

impl Cart {
    /// Project the server lines into a quantity map.
    #[must_use]
    pub fn quantities(&self) -> QuantityMap {
        let mut map = QuantityMap::new();
        for item in &self.items {
            let entry = map.entry(item.product.id().clone()).or_insert(0);
            *entry = entry.saturating_add(item.quantity);
        }
        map
    }

    /// Quantity currently held for a product.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.quantities().get(product_id).copied().unwrap_or(0)
    }

    /// Cart total as sent by the server, else the sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.total.map_or_else(
            || Price::of(sum_amounts(self.items.iter().map(|i| i.line_total().amount))),
            Price::of,
        )
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, i| count.saturating_add(i.quantity))
    }
}

/// One entry of the guest cart cookie: quantity plus a display snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    pub image: Option<String>,
}

impl GuestCartItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::of(self.price).line_total(self.quantity, Decimal::ZERO)
    }
}

/// The guest cart stored in the `cart` cookie.
///
/// ```
/// use rust_decimal::Decimal;
/// use storehouse_core::cart::{GuestCart, GuestCartItem};
/// use storehouse_core::ProductId;
///
/// let mut cart = GuestCart::default();
/// cart.add(GuestCartItem {
///     product_id: ProductId::new("p1"),
///     quantity: 2,
///     name: "Cap".into(),
///     price: Decimal::new(12, 0),
///     image: None,
/// });
///
/// let cookie = cart.to_cookie_value();
/// let restored = GuestCart::from_cookie_value(&cookie).unwrap();
/// assert_eq!(restored.quantity_of(&ProductId::new("p1")), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestCart {
    items: Vec<GuestCartItem>,
}

impl GuestCart {
    /// Name of the cookie holding the guest cart.
    pub const COOKIE_NAME: &'static str = "cart";

    /// Decode a cookie value: URL-decode, then parse the JSON array.
    ///
    /// The cookie is client-controlled, so entries are normalised the same
    /// way [`GuestCart::add`] would have built them: zero quantities and
    /// blank ids are dropped, repeated ids are folded into one line, each
    /// quantity is capped at [`MAX_LINE_QUANTITY`] and out-of-range price
    /// snapshots become zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not URL-encoded UTF-8 or not a JSON
    /// array of cart entries.
    pub fn from_cookie_value(raw: &str) -> Result<Self, GuestCartError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let decoded = urlencoding::decode(raw)?;
        let entries: Vec<GuestCartItem> = serde_json::from_str(&decoded)?;

        let mut cart = Self::default();
        for mut entry in entries {
            if entry.quantity == 0 || entry.product_id.as_str().trim().is_empty() {
                continue;
            }
            if entry.price.is_sign_negative() || entry.price > MAX_SNAPSHOT_PRICE {
                entry.price = Decimal::ZERO;
            }
            match cart
                .items
                .iter_mut()
                .find(|existing| existing.product_id == entry.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .saturating_add(entry.quantity)
                        .min(MAX_LINE_QUANTITY);
                }
                None => cart.items.push(GuestCartItem {
                    quantity: entry.quantity.min(MAX_LINE_QUANTITY),
                    ..entry
                }),
            }
        }
        Ok(cart)
    }

    /// Encode as a cookie value: JSON array, URL-encoded.
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        let json = serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string());
        urlencoding::encode(&json).into_owned()
    }

    /// Add `item.quantity` units of a product.
    ///
    /// An existing entry accumulates the quantity and takes the newer
    /// snapshot; a new product is appended. Adding a quantity of zero removes
    /// the product instead.
    pub fn add(&mut self, item: GuestCartItem) {
        if item.quantity == 0 {
            self.remove(&item.product_id);
            return;
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            existing.quantity = existing
                .quantity
                .saturating_add(item.quantity)
                .min(MAX_LINE_QUANTITY);
            existing.name = item.name;
            existing.price = item.price;
            if item.image.is_some() {
                existing.image = item.image;
            }
        } else {
            self.items.push(GuestCartItem {
                quantity: item.quantity.min(MAX_LINE_QUANTITY),
                ..item
            });
        }
    }

    /// Replace the quantity of a product already in the cart; zero removes it.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() != before
    }

    #[must_use]
    pub fn items(&self) -> &[GuestCartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn quantities(&self) -> QuantityMap {
        self.items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|i| &i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, i| count.saturating_add(i.quantity))
    }

    /// Subtotal from the price snapshots.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::of(sum_amounts(self.items.iter().map(|i| i.line_total().amount)))
    }
}

fn sum_amounts(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(id: &str, quantity: u32) -> GuestCartItem {
        GuestCartItem {
            product_id: ProductId::new(id),
            quantity,
            name: format!("Product {id}"),
            price: Decimal::new(1_050, 2),
            image: None,
        }
    }

    #[test]
    fn test_adding_twice_accumulates() {
        let mut cart = GuestCart::default();
        cart.add(snapshot("p1", 1));
        cart.add(snapshot("p1", 2));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), 3);
    }

    #[test]
    fn test_adding_zero_removes_entry() {
        let mut cart = GuestCart::default();
        cart.add(snapshot("p1", 2));
        cart.add(snapshot("p2", 1));
        cart.add(snapshot("p1", 0));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), 0);
        assert_eq!(cart.items().len(), 1);

        let restored = GuestCart::from_cookie_value(&cart.to_cookie_value()).unwrap();
        assert!(!restored.quantities().contains_key(&ProductId::new("p1")));
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = GuestCart::default();
        cart.add(snapshot("p1", 2));
        assert!(cart.set_quantity(&ProductId::new("p1"), 5));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), 5);
        assert!(!cart.set_quantity(&ProductId::new("missing"), 5));
        assert!(cart.set_quantity(&ProductId::new("p1"), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = GuestCart::default();
        cart.add(snapshot("p1", MAX_LINE_QUANTITY));
        cart.add(snapshot("p1", 5));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_cookie_value_is_url_encoded_json() {
        let mut cart = GuestCart::default();
        cart.add(snapshot("p1", 2));
        let value = cart.to_cookie_value();
        assert!(value.starts_with("%5B%7B"));
        assert!(!value.contains('"'));

        let json = urlencoding::decode(&value).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["productId"], "p1");
        assert_eq!(parsed[0]["quantity"], 2);
    }

    #[test]
    fn test_malformed_cookie_is_an_error() {
        assert!(GuestCart::from_cookie_value("not-json").is_err());
        assert!(GuestCart::from_cookie_value("").unwrap().is_empty());
    }

    fn tampered(json: &str) -> GuestCart {
        GuestCart::from_cookie_value(&urlencoding::encode(json)).unwrap()
    }

    #[test]
    fn test_cookie_quantities_are_capped_on_read() {
        let cart = tampered(
            r#"[{"productId":"a","quantity":4294967295},{"productId":"b","quantity":1}]"#,
        );
        assert_eq!(cart.quantity_of(&ProductId::new("a")), MAX_LINE_QUANTITY);
        assert_eq!(cart.item_count(), MAX_LINE_QUANTITY + 1);
    }

    #[test]
    fn test_cookie_duplicates_are_folded() {
        let cart = tampered(
            r#"[{"productId":"a","quantity":600,"name":"Cap"},
                {"productId":"a","quantity":600,"name":"Other"},
                {"productId":"","quantity":2}]"#,
        );
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].name, "Cap");
        assert_eq!(cart.quantity_of(&ProductId::new("a")), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_cookie_prices_out_of_range_become_zero() {
        let cart = tampered(
            r#"[{"productId":"a","quantity":3,"price":"70000000000000000000000000000"},
                {"productId":"b","quantity":1,"price":"-5"},
                {"productId":"c","quantity":2,"price":"4.50"}]"#,
        );
        assert_eq!(cart.items()[0].price, Decimal::ZERO);
        assert_eq!(cart.items()[1].price, Decimal::ZERO);
        assert_eq!(cart.subtotal().amount, Decimal::new(900, 2));
    }

    #[test]
    fn test_server_cart_count_saturates() {
        let cart: Cart = serde_json::from_str(
            r#"{"items":[
                {"product":"p1","quantity":4294967295,"price":1},
                {"product":"p2","quantity":5,"price":1}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_subtotal() {
        let mut cart = GuestCart::default();
        cart.add(snapshot("p1", 2));
        cart.add(snapshot("p2", 1));
        assert_eq!(cart.subtotal().amount, Decimal::new(3_150, 2));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_server_cart_projection() {
        let cart: Cart = serde_json::from_str(
            r#"{"items":[
                {"product":{"_id":"p1","name":"Cap"},"quantity":2,"price":10,"total":20},
                {"product":"p2","quantity":1,"price":5}
            ]}"#,
        )
        .unwrap();
        let map = cart.quantities();
        assert_eq!(map.get(&ProductId::new("p1")), Some(&2));
        assert_eq!(map.get(&ProductId::new("p2")), Some(&1));
        assert_eq!(cart.total_price().amount, Decimal::new(25, 0));
    }
}
