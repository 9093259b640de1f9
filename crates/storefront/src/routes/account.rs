//! Account route handlers.
//!
//! These routes require a signed-in customer. The order views are shared with
//! the tracking and checkout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use storehouse_core::{ApiBaseUrl, Order, OrderId, Price};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// One step of the status timeline.
#[derive(Debug, Clone)]
pub struct TimelineView {
    pub label: &'static str,
    pub reached: bool,
    pub current: bool,
    pub cancelled: bool,
}

/// One order line as rendered.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub total: String,
}

/// Order display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub code: String,
    pub placed_at: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub payment_status: &'static str,
    pub payment_method: &'static str,
    pub item_count: u32,
    pub subtotal: Option<String>,
    pub discount: Option<String>,
    pub promotion_code: Option<String>,
    pub total: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub note: Option<String>,
    pub lines: Vec<OrderLineView>,
    pub timeline: Vec<TimelineView>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, base_url: &ApiBaseUrl) -> Self {
        Self {
            id: order.id.to_string(),
            code: order.code().to_string(),
            placed_at: order
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            payment_status: order.payment_status.label(),
            payment_method: order.payment_method.label(),
            item_count: order.item_count(),
            subtotal: order.subtotal.map(|v| Price::of(v).display()),
            discount: order
                .discount_amount
                .filter(|v| !v.is_zero())
                .map(|v| Price::of(v).display()),
            promotion_code: order.promotion_code.clone(),
            total: order.total_price().display(),
            contact_name: order.shipping.full_name.clone(),
            contact_phone: order.shipping.phone.clone(),
            contact_address: order.shipping.address.clone(),
            note: order.note.clone().filter(|n| !n.trim().is_empty()),
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    name: item.display_name().to_string(),
                    image: item.product.image_url().map(|url| base_url.asset(url)),
                    quantity: item.quantity,
                    price: Price::of(item.price).display(),
                    total: item.line_total().display(),
                })
                .collect(),
            timeline: order
                .status
                .timeline()
                .into_iter()
                .map(|step| TimelineView {
                    label: step.status.label(),
                    reached: step.reached,
                    current: step.current,
                    cancelled: step.status == storehouse_core::OrderStatus::Cancelled,
                })
                .collect(),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: Layout,
    pub email: String,
    pub orders: Vec<OrderView>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderView,
}

/// Display the signed-in customer's order history.
#[instrument(skip(state, session, customer), fields(customer_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = state.api().my_orders(&customer.token()).await?;
    let base_url = state.api().base_url();

    Ok(AccountIndexTemplate {
        layout: Layout::load(&state, &session, Some(&customer)).await,
        email: customer.email.clone(),
        orders: orders.iter().map(|o| OrderView::new(o, base_url)).collect(),
    })
}

/// Display one of the signed-in customer's orders.
#[instrument(skip(state, session, customer), fields(customer_id = %customer.id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = match state
        .api()
        .get_order(&customer.token(), &OrderId::new(id.clone()))
        .await
    {
        Ok(order) => order,
        Err(ApiError::Business(_) | ApiError::Status(403 | 404)) => {
            return Err(AppError::NotFound(format!("order {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(OrderShowTemplate {
        layout: Layout::load(&state, &session, Some(&customer)).await,
        order: OrderView::new(&order, state.api().base_url()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_view_timeline() {
        let order: Order = serde_json::from_str(
            r#"{"_id":"o1","orderCode":"SH-1","total":42,"status":"shipped",
                "items":[{"product":"p1","name":"Mug","quantity":2,"price":21}]}"#,
        )
        .unwrap();
        let (base, _) = ApiBaseUrl::resolve(None);
        let view = OrderView::new(&order, &base);

        assert_eq!(view.code, "SH-1");
        assert_eq!(view.total, "$42.00");
        assert_eq!(view.lines[0].total, "$42.00");
        let reached: Vec<bool> = view.timeline.iter().map(|s| s.reached).collect();
        assert_eq!(reached, vec![true, true, true, false]);
        assert_eq!(view.timeline.iter().filter(|s| s.current).count(), 1);
    }

    #[test]
    fn test_cancelled_order_marks_cancellation() {
        let order: Order =
            serde_json::from_str(r#"{"_id":"o2","total":0,"status":"cancelled"}"#).unwrap();
        let (base, _) = ApiBaseUrl::resolve(None);
        let view = OrderView::new(&order, &base);
        assert!(view.timeline.last().is_some_and(|s| s.cancelled && s.current));
    }
}
