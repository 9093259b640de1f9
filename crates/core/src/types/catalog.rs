//! Catalog records: products, their images, and categories.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::{Price, discount_percent};
use super::status::{ActiveStatus, ProductStatus};

/// A product as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<CategoryRef>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    /// Percentage off, when the server sets one explicitly.
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub position: i32,
    pub stock: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Images ordered by their `position`.
    #[must_use]
    pub fn sorted_images(&self) -> Vec<&ProductImage> {
        let mut images: Vec<&ProductImage> = self.images.iter().collect();
        images.sort_by_key(|img| img.position);
        images
    }

    /// The image shown on cards and in the cart.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.iter().min_by_key(|img| img.position)
    }

    /// Selling price.
    #[must_use]
    pub fn selling_price(&self) -> Price {
        Price::of(self.price)
    }

    /// Discount badge value: the explicit discount, else derived from the
    /// compare-at price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u8> {
        use rust_decimal::prelude::ToPrimitive;

        self.discount
            .filter(|d| *d > Decimal::ZERO)
            .and_then(|d| d.round().to_u8())
            .or_else(|| discount_percent(self.price, self.compare_price))
    }

    /// ID of the product's category, populated or not.
    #[must_use]
    pub fn category_id(&self) -> Option<&CategoryId> {
        self.category.as_ref().map(CategoryRef::id)
    }

    /// Name of the product's category when the server populated it.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().and_then(CategoryRef::name)
    }

    /// Whether shoppers can buy the product.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active && self.stock.is_none_or(|s| s > 0)
    }
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub position: u32,
    pub alt: Option<String>,
}

/// A category reference that the server may or may not populate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Populated {
        #[serde(alias = "_id")]
        id: CategoryId,
        name: String,
    },
    Id(CategoryId),
}

impl CategoryRef {
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        match self {
            Self::Populated { id, .. } | Self::Id(id) => id,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Populated { name, .. } => Some(name),
            Self::Id(_) => None,
        }
    }
}

/// Minimal product data embedded in carts and order lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// A product reference that the server may or may not populate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Populated(ProductSummary),
    Id(ProductId),
}

impl ProductRef {
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        match self {
            Self::Populated(summary) => &summary.id,
            Self::Id(id) => id,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Populated(summary) => Some(&summary.name),
            Self::Id(_) => None,
        }
    }

    /// First image URL of a populated reference.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Populated(summary) => summary
                .images
                .iter()
                .min_by_key(|img| img.position)
                .map(|img| img.url.as_str()),
            Self::Id(_) => None,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ActiveStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "_id": "p1",
        "name": "Linen Shirt",
        "category": {"_id": "c1", "name": "Shirts"},
        "price": 45,
        "comparePrice": 60,
        "images": [
            {"url": "/img/b.jpg", "position": 2},
            {"url": "/img/a.jpg", "position": 1}
        ],
        "status": "active"
    }"#;

    #[test]
    fn test_product_from_api_json() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.category_id().map(CategoryId::as_str), Some("c1"));
        assert_eq!(product.category_name(), Some("Shirts"));
        assert_eq!(product.primary_image().map(|i| i.url.as_str()), Some("/img/a.jpg"));
        assert_eq!(product.discount_percent(), Some(25));
        assert!(product.is_purchasable());
    }

    #[test]
    fn test_unpopulated_category() {
        let product: Product =
            serde_json::from_str(r#"{"id":"p2","name":"Cap","category":"c9","price":"12.5"}"#)
                .unwrap();
        assert_eq!(product.category_id().map(CategoryId::as_str), Some("c9"));
        assert_eq!(product.category_name(), None);
        assert_eq!(product.price, Decimal::new(125, 1));
        assert_eq!(product.discount_percent(), None);
    }

    #[test]
    fn test_explicit_discount_wins() {
        let mut product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        product.discount = Some(Decimal::new(10, 0));
        assert_eq!(product.discount_percent(), Some(10));
    }

    #[test]
    fn test_draft_is_not_purchasable() {
        let mut product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        product.status = ProductStatus::Draft;
        assert!(!product.is_purchasable());
    }
}
