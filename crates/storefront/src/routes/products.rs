//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use storehouse_core::{ApiBaseUrl, Notice, Page, Price, Product, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::api::{ApiError, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub price: String,
    pub compare_price: Option<String>,
    pub discount: Option<u8>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub purchasable: bool,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, base_url: &ApiBaseUrl) -> Self {
        let compare_price = product
            .compare_price
            .filter(|compare| *compare > product.price)
            .map(|compare| Price::of(compare).display());

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category_name().map(String::from),
            price: product.selling_price().display(),
            compare_price,
            discount: product.discount_percent(),
            image: product.primary_image().map(|img| base_url.asset(&img.url)),
            images: product
                .sorted_images()
                .into_iter()
                .map(|img| base_url.asset(&img.url))
                .collect(),
            purchasable: product.is_purchasable(),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub category: Option<String>,
    pub q: Option<String>,
}

impl ListQuery {
    fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductView>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_more_pages: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
}

/// Display product listing page.
///
/// With a search term the list comes from the search endpoint only; paging
/// and the category filter apply to the plain listing.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let mut layout = Layout::load(&state, &session, customer.as_ref()).await;
    let base_url = state.api().base_url();

    let result = match query.search_term() {
        Some(term) => state.api().search_products(term).await.map(Page::single),
        None => {
            let listing = ProductQuery {
                page: query.page.unwrap_or(1).max(1),
                category: query.category.clone(),
                ..ProductQuery::default()
            };
            state.api().list_products(&listing).await
        }
    };

    let page = match result {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            layout.notice = Some(Notice::error(e.user_message()));
            Page::single(Vec::new())
        }
    };

    ProductsIndexTemplate {
        products: page
            .items
            .iter()
            .map(|product| ProductView::new(product, base_url))
            .collect(),
        search: query.search_term().map(String::from),
        category: query.category.clone().filter(|c| !c.is_empty()),
        current_page: page.page,
        total_pages: page.total_pages(),
        has_more_pages: page.has_next(),
        layout,
    }
}

/// Display product detail page.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = match state.api().get_product(&ProductId::new(id.clone())).await {
        Ok(product) => product,
        Err(ApiError::Business(_) | ApiError::Status(404)) => {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ProductShowTemplate {
        layout: Layout::load(&state, &session, customer.as_ref()).await,
        product: ProductView::new(&product, state.api().base_url()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_view_computes_discount() {
        let product: Product = serde_json::from_str(
            r#"{"_id":"p1","name":"Tote","price":30,"comparePrice":40,
                "images":[{"url":"/uploads/t.jpg","position":0}],"status":"active"}"#,
        )
        .unwrap();
        let (base, _) = ApiBaseUrl::resolve(Some("http://api.test"));
        let view = ProductView::new(&product, &base);

        assert_eq!(view.price, "$30.00");
        assert_eq!(view.compare_price.as_deref(), Some("$40.00"));
        assert_eq!(view.discount, Some(25));
        assert_eq!(view.image.as_deref(), Some("http://api.test/uploads/t.jpg"));
        assert!(view.purchasable);
    }

    #[test]
    fn test_compare_price_hidden_when_not_higher() {
        let product: Product =
            serde_json::from_str(r#"{"_id":"p1","name":"Tote","price":30,"comparePrice":30}"#)
                .unwrap();
        let (base, _) = ApiBaseUrl::resolve(None);
        assert_eq!(ProductView::new(&product, &base).compare_price, None);
    }

    #[test]
    fn test_blank_search_is_a_listing() {
        let query = ListQuery {
            q: Some("  ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(query.search_term(), None);
    }
}
