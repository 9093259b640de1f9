//! Checkout route handlers.
//!
//! Guests send their cookie cart lines with the order; signed-in customers
//! order their server cart, which the server empties on success.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use storehouse_core::cart::GuestCart;
use storehouse_core::validation::{CheckoutForm, ValidationErrors};
use storehouse_core::{Notice, PaymentMethod};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use super::account::OrderView;
use super::cart::load_cart;
use crate::api::{ApiError, OrderLine, PlaceOrder};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentCustomer;
use crate::services::cart::{CartView, guest_cart_cookie, read_guest_cart};
use crate::services::notice;
use crate::state::AppState;

/// An `<option>` of a select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn payment_options(selected: &str) -> Vec<SelectOption> {
    PaymentMethod::ALL
        .iter()
        .enumerate()
        .map(|(i, method)| SelectOption {
            value: method.as_str(),
            label: method.label(),
            selected: method.as_str() == selected || (selected.is_empty() && i == 0),
        })
        .collect()
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: ValidationErrors,
    pub payment_methods: Vec<SelectOption>,
}

impl CheckoutTemplate {
    fn new(layout: Layout, cart: CartView, form: CheckoutForm, errors: ValidationErrors) -> Self {
        let payment_methods = payment_options(&form.payment_method);
        Self {
            layout,
            cart,
            form,
            errors,
            payment_methods,
        }
    }
}

/// Order placed template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {
    pub layout: Layout,
    pub order: OrderView,
}

async fn refuse_empty_cart(session: &Session) -> Response {
    notice::flash(session, Notice::info("Your cart is empty.")).await;
    Redirect::to("/cart").into_response()
}

/// Display the checkout form, prefilled for signed-in customers.
#[instrument(skip(state, session, headers, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let cart = match load_cart(&state, &headers, customer.as_ref()).await {
        Ok(cart) => cart,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for checkout");
            notice::flash(&session, Notice::error(e.user_message())).await;
            return Ok(Redirect::to("/cart").into_response());
        }
    };
    if cart.is_empty() {
        return Ok(refuse_empty_cart(&session).await);
    }

    let form = customer
        .as_ref()
        .map(|c| CheckoutForm {
            full_name: c.name.clone(),
            email: c.email.clone(),
            ..CheckoutForm::default()
        })
        .unwrap_or_default();

    let layout = Layout::load(&state, &session, customer.as_ref()).await;
    Ok(CheckoutTemplate::new(layout, cart, form, ValidationErrors::new()).into_response())
}

/// Validate the form and place the order.
#[instrument(skip(state, session, headers, customer, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let guest_cart = customer.is_none().then(|| read_guest_cart(&headers));
    let cart = match &guest_cart {
        Some(guest) => CartView::from_guest(guest, state.api().base_url()),
        None => match load_cart(&state, &headers, customer.as_ref()).await {
            Ok(cart) => cart,
            Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
            Err(e) => {
                notice::flash(&session, Notice::error(e.user_message())).await;
                return Ok(Redirect::to("/cart").into_response());
            }
        },
    };
    if cart.is_empty() {
        return Ok(refuse_empty_cart(&session).await);
    }

    let layout = Layout::load(&state, &session, customer.as_ref()).await;

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let layout = layout.with_notice(Notice::error(errors.summary()));
            return Ok(CheckoutTemplate::new(layout, cart, form, errors).into_response());
        }
    };

    let items = guest_cart
        .as_ref()
        .map(|guest| {
            guest
                .items()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })
                .collect()
        })
        .unwrap_or_default();
    let order = PlaceOrder {
        checkout: draft,
        items,
    };

    let token = customer.as_ref().map(CurrentCustomer::token);
    let placed = match state.api().place_order(token.as_ref(), &order).await {
        Ok(placed) => placed,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Order was not placed");
            let layout = layout.with_notice(Notice::error(e.user_message()));
            return Ok(
                CheckoutTemplate::new(layout, cart, form, ValidationErrors::new()).into_response(),
            );
        }
    };

    tracing::info!(order_id = %placed.id, guest = guest_cart.is_some(), "Order placed");

    let page = CheckoutCompleteTemplate {
        layout: layout.with_notice(Notice::success(format!(
            "Thank you! Your order {} has been placed.",
            placed.code()
        ))),
        order: OrderView::new(&placed, state.api().base_url()),
    };

    if guest_cart.is_some() {
        let cookie = guest_cart_cookie(&GuestCart::default(), state.config().is_secure());
        return Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), page).into_response());
    }
    Ok(page.into_response())
}
