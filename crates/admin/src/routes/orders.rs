//! Order list, detail and status management.
//!
//! Status forms post the status the page was rendered with alongside the
//! selected one. Submitting the status an order already has is answered
//! locally without calling the API.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use storehouse_core::validation::status_change;
use storehouse_core::{
    ApiBaseUrl, Capability, Module, Notice, Order, OrderId, OrderStatus, PaymentStatus, Price,
};
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, Pagination, SelectOption, enum_options, format_date};
use crate::api::OrderListQuery;
use crate::error::{AppError, Result, failure_notice};
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_permission};
use crate::services::notice;
use crate::state::AppState;

/// One row of the order table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub href: String,
    pub code: String,
    pub customer: String,
    pub placed_at: String,
    pub item_count: u32,
    pub total: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub payment_status: &'static str,
}

impl OrderRow {
    #[must_use]
    pub fn new(order: &Order) -> Self {
        let customer = if order.is_guest() {
            format!("{} (guest)", order.shipping.full_name)
        } else {
            order.shipping.full_name.clone()
        };
        Self {
            href: order_path(&order.id),
            code: order.code().to_string(),
            customer,
            placed_at: format_date(order.created_at),
            item_count: order.item_count(),
            total: order.total_price().display(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            payment_status: order.payment_status.label(),
        }
    }
}

/// One order line on the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineRow {
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub discount: Option<String>,
    pub total: String,
}

/// Everything the detail page shows about one order.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub path: String,
    pub code: String,
    pub placed_at: String,
    pub updated_at: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub payment_status: &'static str,
    pub payment_status_label: &'static str,
    pub payment_method: &'static str,
    pub is_guest: bool,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub note: Option<String>,
    pub lines: Vec<OrderLineRow>,
    pub subtotal: Option<String>,
    pub discount: Option<String>,
    pub promotion_code: Option<String>,
    pub total: String,
}

impl OrderDetail {
    fn new(order: &Order, base_url: &ApiBaseUrl) -> Self {
        Self {
            path: order_path(&order.id),
            code: order.code().to_string(),
            placed_at: format_date(order.created_at),
            updated_at: format_date(order.updated_at),
            status: order.status.as_str(),
            status_label: order.status.label(),
            payment_status: order.payment_status.as_str(),
            payment_status_label: order.payment_status.label(),
            payment_method: order.payment_method.label(),
            is_guest: order.is_guest(),
            contact_name: order.shipping.full_name.clone(),
            contact_email: order.shipping.email.clone(),
            contact_phone: order.shipping.phone.clone(),
            contact_address: order.shipping.address.clone(),
            note: order.note.clone().filter(|n| !n.trim().is_empty()),
            lines: order
                .items
                .iter()
                .map(|item| OrderLineRow {
                    name: item.display_name().to_string(),
                    image: item.product.image_url().map(|url| base_url.asset(url)),
                    quantity: item.quantity,
                    price: Price::of(item.price).display(),
                    discount: (!item.discount.is_zero()).then(|| format!("{}%", item.discount)),
                    total: item.line_total().display(),
                })
                .collect(),
            subtotal: order.subtotal.map(|v| Price::of(v).display()),
            discount: order
                .discount_amount
                .filter(|v| !v.is_zero())
                .map(|v| Price::of(v).display()),
            promotion_code: order.promotion_code.clone(),
            total: order.total_price().display(),
        }
    }
}

fn order_path(id: &OrderId) -> String {
    format!("/orders/{}", urlencoding::encode(id.as_str()))
}

/// Order list query string.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: String,
    pub page: Option<u32>,
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRow>,
    pub filter: String,
    pub statuses: Vec<SelectOption>,
    pub pagination: Pagination,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderDetail,
    pub statuses: Vec<SelectOption>,
    pub payment_statuses: Vec<SelectOption>,
    pub can_update: bool,
}

/// Posted status change. `current` is the status the page showed.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub status: String,
}

impl StatusForm {
    fn parse<T: FromStr>(&self) -> Result<(T, T)> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("Unknown status: {raw}")))
        };
        Ok((parse(&self.current)?, parse(&self.status)?))
    }
}

/// Order list, optionally filtered by status.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(filter): Query<OrderFilter>,
) -> Result<OrdersIndexTemplate> {
    require_permission(&admin, Module::Order, Capability::View)?;

    // An unknown status in the URL lists every order.
    let status = filter.status.parse::<OrderStatus>().ok();
    let query = OrderListQuery {
        page: filter.page.unwrap_or(1).max(1),
        status,
    };
    let page = state.api().list_orders(&admin.credentials(), &query).await?;

    let filter_value = status.map(OrderStatus::as_str).unwrap_or_default();
    let base = status.map_or_else(
        || "/orders?".to_string(),
        |s| format!("/orders?status={}&", s.as_str()),
    );
    let statuses = std::iter::once(SelectOption {
        value: String::new(),
        label: "All statuses".to_string(),
        selected: status.is_none(),
    })
    .chain(OrderStatus::ALL.iter().map(|&s| SelectOption {
        value: s.as_str().to_string(),
        label: s.label().to_string(),
        selected: status == Some(s),
    }))
    .collect();

    Ok(OrdersIndexTemplate {
        layout: Layout::load(&session, &admin, Some(Module::Order)).await,
        orders: page.items.iter().map(OrderRow::new).collect(),
        filter: filter_value.to_string(),
        statuses,
        pagination: Pagination::new(&page, &base),
    })
}

/// Order detail with the status forms.
#[instrument(skip(state, session, admin))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<OrderShowTemplate> {
    require_permission(&admin, Module::Order, Capability::View)?;

    let order = state
        .api()
        .get_order(&admin.credentials(), &OrderId::new(id))
        .await?;

    Ok(OrderShowTemplate {
        layout: Layout::load(&session, &admin, Some(Module::Order)).await,
        statuses: enum_options(
            OrderStatus::ALL,
            order.status.as_str(),
            OrderStatus::as_str,
            OrderStatus::label,
        ),
        payment_statuses: enum_options(
            PaymentStatus::ALL,
            order.payment_status.as_str(),
            PaymentStatus::as_str,
            PaymentStatus::label,
        ),
        can_update: admin.can(Module::Order, Capability::Update),
        order: OrderDetail::new(&order, state.api().base_url()),
    })
}

/// Change an order's fulfillment status.
#[instrument(skip(state, session, admin))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Order, Capability::Update)?;
    let id = OrderId::new(id);
    let back = order_path(&id);
    let (current, requested) = form.parse::<OrderStatus>()?;

    let Some(status) = status_change(current, requested) else {
        notice::flash(
            &session,
            Notice::info(format!("The order is already {}.", current.label().to_lowercase())),
        )
        .await;
        return Ok(Redirect::to(&back));
    };

    let outcome = match state
        .api()
        .update_order_status(&admin.credentials(), &id, status)
        .await
    {
        Ok(()) => {
            tracing::info!(order_id = %id, status = %status, "Order status changed");
            Notice::success(format!("Order status changed to {}.", status.label()))
        }
        Err(e) => failure_notice(e)?,
    };
    notice::flash(&session, outcome).await;
    Ok(Redirect::to(&back))
}

/// Change an order's payment status.
#[instrument(skip(state, session, admin))]
pub async fn update_payment_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Order, Capability::Update)?;
    let id = OrderId::new(id);
    let back = order_path(&id);
    let (current, requested) = form.parse::<PaymentStatus>()?;

    let Some(payment_status) = status_change(current, requested) else {
        notice::flash(
            &session,
            Notice::info(format!(
                "The payment is already {}.",
                current.label().to_lowercase()
            )),
        )
        .await;
        return Ok(Redirect::to(&back));
    };

    let outcome = match state
        .api()
        .update_payment_status(&admin.credentials(), &id, payment_status)
        .await
    {
        Ok(()) => {
            tracing::info!(
                order_id = %id,
                payment_status = %payment_status,
                "Payment status changed"
            );
            Notice::success(format!(
                "Payment status changed to {}.",
                payment_status.label()
            ))
        }
        Err(e) => failure_notice(e)?,
    };
    notice::flash(&session, outcome).await;
    Ok(Redirect::to(&back))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_form_parse() {
        let form = StatusForm {
            current: "shipped".to_string(),
            status: "delivered".to_string(),
        };
        let parsed = form.parse::<OrderStatus>().ok();
        assert_eq!(parsed, Some((OrderStatus::Shipped, OrderStatus::Delivered)));

        let form = StatusForm {
            current: "shipped".to_string(),
            status: "lost".to_string(),
        };
        assert!(matches!(
            form.parse::<OrderStatus>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_order_path_is_encoded() {
        assert_eq!(order_path(&OrderId::new("a/b")), "/orders/a%2Fb");
    }
}
