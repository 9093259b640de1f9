//! Cart reconciliation.
//!
//! A request reads exactly one cart: the `cart` cookie for guests, the
//! server cart for signed-in customers. Server writes are create-or-replace
//! per line, so when one fails the server cart is fetched again and shown as
//! the truth, together with the error.

use axum::http::{HeaderMap, header};
use secrecy::SecretString;
use storehouse_core::cart::{Cart, GuestCart, GuestCartItem, MAX_LINE_QUANTITY};
use storehouse_core::{ApiBaseUrl, Notice, Price, Product, ProductId};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::api::{ApiError, StorefrontApi};

/// One cart line as rendered.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            subtotal: Price::of(rust_decimal::Decimal::ZERO).display(),
            item_count: 0,
        }
    }

    #[must_use]
    pub fn from_guest(cart: &GuestCart, base_url: &ApiBaseUrl) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    image: item.image.as_deref().map(|url| base_url.asset(url)),
                    quantity: item.quantity,
                    unit_price: Price::of(item.price).display(),
                    line_total: item.line_total().display(),
                })
                .collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn from_server(cart: &Cart, base_url: &ApiBaseUrl) -> Self {
        Self {
            lines: cart
                .items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product.id().to_string(),
                    name: item.display_name().to_string(),
                    image: item.product.image_url().map(|url| base_url.asset(url)),
                    quantity: item.quantity,
                    unit_price: Price::of(item.price).display(),
                    line_total: item.line_total().display(),
                })
                .collect(),
            subtotal: cart.total_price().display(),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Read the guest cart from the request cookies.
///
/// A cookie that does not decode is treated as an empty cart.
#[must_use]
pub fn read_guest_cart(headers: &HeaderMap) -> GuestCart {
    let Some(raw) = cookie_value(headers, GuestCart::COOKIE_NAME) else {
        return GuestCart::default();
    };

    GuestCart::from_cookie_value(&raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed cart cookie: {e}");
        GuestCart::default()
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` value persisting the guest cart. An empty cart expires the
/// cookie instead of storing `[]`.
#[must_use]
pub fn guest_cart_cookie(cart: &GuestCart, secure: bool) -> String {
    let builder = Cookie::build((GuestCart::COOKIE_NAME, cart.to_cookie_value()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    let cookie = if cart.is_empty() {
        builder.max_age(Duration::ZERO).build()
    } else {
        builder.max_age(Duration::days(30)).build()
    };
    cookie.to_string()
}

/// Snapshot of a product stored with a guest cart entry.
fn snapshot(product: &Product, quantity: u32) -> GuestCartItem {
    GuestCartItem {
        product_id: product.id.clone(),
        quantity,
        name: product.name.clone(),
        price: product.price,
        image: product.primary_image().map(|img| img.url.clone()),
    }
}

/// Add a product to the guest cart.
///
/// The product is fetched so the cookie carries a current name and price.
/// A quantity of zero removes the entry without a lookup.
///
/// # Errors
///
/// Returns an [`ApiError`] if the product cannot be loaded or is not for sale.
pub async fn add_to_guest_cart(
    api: &StorefrontApi,
    cart: &mut GuestCart,
    product_id: &ProductId,
    quantity: u32,
) -> Result<(), ApiError> {
    if quantity == 0 {
        cart.remove(product_id);
        return Ok(());
    }

    let product = api.get_product(product_id).await?;
    if !product.is_purchasable() {
        return Err(ApiError::Business(format!(
            "{} is not available right now",
            product.name
        )));
    }

    cart.add(snapshot(&product, quantity));
    Ok(())
}

/// Outcome of a server cart write.
#[derive(Debug)]
pub struct Reconciled {
    /// The cart to render.
    pub cart: Cart,
    /// Set when the write failed and `cart` is the re-fetched server state.
    pub notice: Option<Notice>,
}

/// Add to the signed-in customer's cart.
///
/// The line endpoint replaces quantities, so the current quantity is read
/// first and the accumulated value is sent.
///
/// When the current cart cannot be read nothing is written, and an empty
/// cart is shown with the error.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when the token was rejected.
pub async fn add_to_server_cart(
    api: &StorefrontApi,
    token: &SecretString,
    product_id: &ProductId,
    quantity: u32,
) -> Result<Reconciled, ApiError> {
    if quantity == 0 {
        return set_server_line(api, token, product_id, 0).await;
    }

    let current = match api.get_cart(token).await {
        Ok(cart) => cart,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read server cart, add skipped");
            return Ok(Reconciled {
                cart: Cart::default(),
                notice: Some(Notice::error(e.user_message())),
            });
        }
    };
    let target = current
        .quantity_of(product_id)
        .saturating_add(quantity)
        .min(MAX_LINE_QUANTITY);
    set_server_line(api, token, product_id, target).await
}

/// Replace one line of the signed-in customer's cart; zero removes it.
///
/// # Errors
///
/// Returns an [`ApiError`] if the re-fetch after a failed write fails too, or
/// [`ApiError::Unauthorized`] when the token was rejected.
pub async fn set_server_line(
    api: &StorefrontApi,
    token: &SecretString,
    product_id: &ProductId,
    quantity: u32,
) -> Result<Reconciled, ApiError> {
    match api
        .set_cart_line(token, product_id, quantity.min(MAX_LINE_QUANTITY))
        .await
    {
        Ok(Some(cart)) => Ok(Reconciled { cart, notice: None }),
        Ok(None) => Ok(Reconciled {
            cart: api.get_cart(token).await?,
            notice: None,
        }),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, "Cart update failed, re-fetching server cart");
            let cart = api.get_cart(token).await?;
            Ok(Reconciled {
                cart,
                notice: Some(Notice::error(e.user_message())),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: &str, quantity: u32) -> GuestCartItem {
        GuestCartItem {
            product_id: ProductId::new(id),
            quantity,
            name: format!("Product {id}"),
            price: Decimal::new(500, 2),
            image: Some("/uploads/p.jpg".to_string()),
        }
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_read_guest_cart_from_cookie_header() {
        let mut cart = GuestCart::default();
        cart.add(item("p1", 2));
        let headers = headers_with(&format!(
            "storehouse_session=abc; cart={}",
            cart.to_cookie_value()
        ));

        assert_eq!(read_guest_cart(&headers), cart);
    }

    #[test]
    fn test_malformed_cookie_is_empty_cart() {
        let headers = headers_with("cart=%7Bnot-an-array");
        assert!(read_guest_cart(&headers).is_empty());
        assert!(read_guest_cart(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_empty_cart_expires_cookie() {
        let header = guest_cart_cookie(&GuestCart::default(), false);
        assert!(header.starts_with("cart=;"));
        assert!(header.contains("Max-Age=0"));
    }

    #[test]
    fn test_cart_cookie_attributes() {
        let mut cart = GuestCart::default();
        cart.add(item("p1", 1));
        let header = guest_cart_cookie(&cart, true);
        assert!(header.starts_with(&format!("cart={}", cart.to_cookie_value())));
        assert!(header.contains("Path=/"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
    }

    #[test]
    fn test_guest_view_resolves_images() {
        let mut cart = GuestCart::default();
        cart.add(item("p1", 3));
        let (base, _) = ApiBaseUrl::resolve(Some("http://api.test:5000"));
        let view = CartView::from_guest(&cart, &base);

        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$15.00");
        assert_eq!(
            view.lines[0].image.as_deref(),
            Some("http://api.test:5000/uploads/p.jpg")
        );
    }
}
