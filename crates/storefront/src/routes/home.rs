//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use super::products::ProductView;
use crate::api::ProductQuery;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Number of products shown on the home page.
const FEATURED_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductView>,
}

/// Display the home page: newest products plus category navigation.
///
/// The catalog endpoint lists newest first; a failure just leaves the grid
/// empty.
#[instrument(skip(state, session, customer))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> impl IntoResponse {
    let query = ProductQuery {
        limit: FEATURED_COUNT,
        ..ProductQuery::default()
    };

    let products = match state.api().list_products(&query).await {
        Ok(page) => page
            .items
            .iter()
            .filter(|product| product.is_purchasable())
            .map(|product| ProductView::new(product, state.api().base_url()))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured products");
            Vec::new()
        }
    };

    HomeTemplate {
        layout: Layout::load(&state, &session, customer.as_ref()).await,
        products,
    }
}
