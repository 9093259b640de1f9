//! Cart route handlers.
//!
//! Every mutation renders the cart page directly, so the customer always
//! sees the cart state that was just read or written.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use storehouse_core::{Notice, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentCustomer;
use crate::services::cart::{
    CartView, add_to_guest_cart, add_to_server_cart, guest_cart_cookie, read_guest_cart,
    set_server_line,
};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
enum CartChange {
    Add(u32),
    Set(u32),
}

/// Load the cart this request reads.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when the customer's token was rejected.
pub async fn load_cart(
    state: &AppState,
    headers: &HeaderMap,
    customer: Option<&CurrentCustomer>,
) -> std::result::Result<CartView, ApiError> {
    let base_url = state.api().base_url();
    match customer {
        Some(customer) => {
            let cart = state.api().get_cart(&customer.token()).await?;
            Ok(CartView::from_server(&cart, base_url))
        }
        None => Ok(CartView::from_guest(&read_guest_cart(headers), base_url)),
    }
}

/// Display cart page.
#[instrument(skip(state, session, headers, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let mut layout = Layout::load(&state, &session, customer.as_ref()).await;

    let cart = match load_cart(&state, &headers, customer.as_ref()).await {
        Ok(cart) => cart,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart");
            layout.notice = Some(Notice::error(e.user_message()));
            CartView::empty()
        }
    };

    Ok(CartShowTemplate { layout, cart }.into_response())
}

/// Add item to cart.
#[instrument(skip(state, session, headers, customer, form), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let change = CartChange::Add(form.quantity.unwrap_or(1));
    apply(&state, &session, &headers, customer, &form.product_id, change).await
}

/// Replace the quantity of a cart line. Zero removes it.
#[instrument(skip(state, session, headers, customer, form), fields(product_id = %form.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let change = CartChange::Set(form.quantity);
    apply(&state, &session, &headers, customer, &form.product_id, change).await
}

/// Remove item from cart.
#[instrument(skip(state, session, headers, customer, form), fields(product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    apply(&state, &session, &headers, customer, &form.product_id, CartChange::Set(0)).await
}

/// Get cart count badge.
#[instrument(skip(state, headers, customer))]
pub async fn count(
    State(state): State<AppState>,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
) -> Result<impl IntoResponse> {
    let count = match load_cart(&state, &headers, customer.as_ref()).await {
        Ok(cart) => cart.item_count,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart count");
            0
        }
    };

    Ok(CartCountTemplate { count })
}

async fn apply(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    customer: Option<CurrentCustomer>,
    product_id: &str,
    change: CartChange,
) -> Result<Response> {
    let product_id = ProductId::new(product_id.trim());
    let layout = Layout::load(state, session, customer.as_ref()).await;

    match customer {
        Some(customer) => {
            let token = customer.token();
            let reconciled = match change {
                CartChange::Add(quantity) => {
                    add_to_server_cart(state.api(), &token, &product_id, quantity).await?
                }
                CartChange::Set(quantity) => {
                    set_server_line(state.api(), &token, &product_id, quantity).await?
                }
            };

            let notice = reconciled.notice.or_else(|| added_notice(change));
            let layout = match notice {
                Some(notice) => layout.with_notice(notice),
                None => layout,
            };
            let cart = CartView::from_server(&reconciled.cart, state.api().base_url());
            Ok(CartShowTemplate { layout, cart }.into_response())
        }
        None => {
            let mut cart = read_guest_cart(headers);
            let outcome = match change {
                CartChange::Add(quantity) => {
                    add_to_guest_cart(state.api(), &mut cart, &product_id, quantity)
                        .await
                        .map_err(|e| Notice::error(e.user_message()))
                }
                CartChange::Set(quantity) => {
                    if cart.set_quantity(&product_id, quantity) || quantity == 0 {
                        Ok(())
                    } else {
                        Err(Notice::error("That product is no longer in your cart."))
                    }
                }
            };

            let view = CartView::from_guest(&cart, state.api().base_url());
            match outcome {
                Ok(()) => {
                    let layout = match added_notice(change) {
                        Some(notice) => layout.with_notice(notice),
                        None => layout,
                    };
                    let cookie = guest_cart_cookie(&cart, state.config().is_secure());
                    Ok((
                        AppendHeaders([(header::SET_COOKIE, cookie)]),
                        CartShowTemplate { layout, cart: view },
                    )
                        .into_response())
                }
                Err(notice) => Ok(CartShowTemplate {
                    layout: layout.with_notice(notice),
                    cart: view,
                }
                .into_response()),
            }
        }
    }
}

fn added_notice(change: CartChange) -> Option<Notice> {
    match change {
        CartChange::Add(quantity) if quantity > 0 => Some(Notice::success("Added to your cart.")),
        CartChange::Add(_) | CartChange::Set(_) => None,
    }
}
