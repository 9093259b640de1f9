//! Catalog endpoints: products, search and categories.

use storehouse_core::{Category, Page, Product, ProductId};
use tracing::instrument;

use super::{ApiError, Listing, StorefrontApi, required};

/// Query for the paged product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            category: None,
        }
    }
}

impl ProductQuery {
    pub const DEFAULT_LIMIT: u32 = 12;

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            params.push(("category", category.to_string()));
        }
        params
    }
}

impl StorefrontApi {
    /// `GET /api/product` with paging and an optional category filter.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let listing: Option<Listing<Product>> =
            self.get("/api/product", &query.to_params(), None).await?;
        Ok(listing.map_or_else(|| Page::single(Vec::new()), Listing::into_page))
    }

    /// `GET /api/product/search?q=`. The full catalog endpoint is never
    /// consulted for a search.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, q: &str) -> Result<Vec<Product>, ApiError> {
        let listing: Option<Listing<Product>> = self
            .get("/api/product/search", &[("q", q.to_string())], None)
            .await?;
        Ok(listing.map(|l| l.into_page().items).unwrap_or_default())
    }

    /// `GET /api/product/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the product is missing.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let path = format!("/api/product/{}", urlencoding::encode(id.as_str()));
        let product = self.get(&path, &[], None).await?;
        required(product, "product")
    }

    /// `GET /api/product/category`: active categories.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let listing: Option<Listing<Category>> =
            self.get("/api/product/category", &[], None).await?;
        Ok(listing.map(|l| l.into_page().items).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = ProductQuery {
            page: 0,
            limit: 24,
            category: Some("c1".to_string()),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "1".to_string()),
                ("limit", "24".to_string()),
                ("category", "c1".to_string()),
            ]
        );
        assert_eq!(ProductQuery::default().to_params().len(), 2);
    }
}
