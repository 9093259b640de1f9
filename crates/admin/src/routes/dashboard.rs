//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use storehouse_core::{Capability, Module};
use tower_sessions::Session;
use tracing::instrument;

use super::orders::OrderRow;
use super::{Layout, NavLink};
use crate::api::OrderListQuery;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// How many orders the dashboard lists.
const RECENT_ORDERS: usize = 5;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub shortcuts: Vec<NavLink>,
    /// `None` when the role cannot view orders.
    pub recent_orders: Option<Vec<OrderRow>>,
    pub order_total: u64,
}

/// Dashboard page handler.
#[instrument(skip(state, session, admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<DashboardTemplate> {
    let layout = Layout::load(&session, &admin, None).await;

    let (recent_orders, order_total) = if admin.can(Module::Order, Capability::View) {
        let page = state
            .api()
            .list_orders(&admin.credentials(), &OrderListQuery::default())
            .await?;
        let rows = page.items.iter().take(RECENT_ORDERS).map(OrderRow::new).collect();
        (Some(rows), page.total)
    } else {
        (None, 0)
    };

    Ok(DashboardTemplate {
        shortcuts: layout.nav.clone(),
        layout,
        recent_orders,
        order_total,
    })
}
