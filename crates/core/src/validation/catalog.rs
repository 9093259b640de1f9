//! Product and category forms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    ValidationErrors, choice, optional_decimal, optional_text, required_decimal, required_text,
};
use crate::types::{ActiveStatus, CategoryId, ProductStatus};

/// Image content types accepted for product uploads.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Largest accepted image upload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Why an uploaded image was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("{file_name}: only JPEG, PNG, WebP and GIF images are allowed")]
    UnsupportedType { file_name: String },
    #[error("{file_name}: file is empty")]
    Empty { file_name: String },
    #[error("{file_name}: images must be at most 5 MB")]
    TooLarge { file_name: String },
}

/// Check one uploaded image before forwarding it.
///
/// # Errors
///
/// Returns an [`ImageError`] for unsupported types, empty files, and files
/// over [`MAX_IMAGE_BYTES`].
pub fn check_image(
    file_name: &str,
    content_type: Option<&str>,
    len: usize,
) -> Result<(), ImageError> {
    let file_name = file_name.to_string();
    let content_type = content_type.unwrap_or_default();
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(ImageError::UnsupportedType { file_name });
    }
    if len == 0 {
        return Err(ImageError::Empty { file_name });
    }
    if len > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge { file_name });
    }
    Ok(())
}

/// Posted category form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub status: String,
}

/// Category create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub status: ActiveStatus,
}

impl CategoryForm {
    pub const NAME_MAX: usize = 100;
    pub const DESCRIPTION_MAX: usize = 500;

    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<CategoryDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", "Name", &self.name, Self::NAME_MAX);
        let description = optional_text(
            &mut errors,
            "description",
            "Description",
            &self.description,
            Self::DESCRIPTION_MAX,
        );
        let status = choice(&mut errors, "status", "Status", &self.status);
        errors.finish(CategoryDraft {
            name,
            description,
            status,
        })
    }
}

/// Posted product form (text fields of the multipart body).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub category_id: String,
    pub price: String,
    pub compare_price: String,
    pub discount: String,
    pub position: String,
    pub status: String,
}

/// Product create/update body (sent alongside the image parts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: CategoryId,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_price: Option<Decimal>,
    pub discount: Decimal,
    pub position: i32,
    pub status: ProductStatus,
}

impl ProductForm {
    pub const NAME_MAX: usize = 200;
    pub const DESCRIPTION_MAX: usize = 5_000;

    /// Assign a text field by its form name. Unknown names are ignored.
    pub fn set(&mut self, field: &str, value: String) {
        match field {
            "name" => self.name = value,
            "description" => self.description = value,
            "category_id" => self.category_id = value,
            "price" => self.price = value,
            "compare_price" => self.compare_price = value,
            "discount" => self.discount = value,
            "position" => self.position = value,
            "status" => self.status = value,
            _ => {}
        }
    }

    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<ProductDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", "Name", &self.name, Self::NAME_MAX);
        let description = optional_text(
            &mut errors,
            "description",
            "Description",
            &self.description,
            Self::DESCRIPTION_MAX,
        );

        let category_id = self.category_id.trim();
        if category_id.is_empty() {
            errors.add("category_id", "Category is required");
        }

        let price = required_decimal(&mut errors, "price", "Price", &self.price, Decimal::ZERO);
        let compare_price = optional_decimal(
            &mut errors,
            "compare_price",
            "Compare-at price",
            &self.compare_price,
            Decimal::ZERO,
        );
        if let Some(compare) = compare_price
            && compare > Decimal::ZERO
            && compare < price
            && !errors.has("price")
        {
            errors.add(
                "compare_price",
                "Compare-at price must not be lower than the price",
            );
        }

        let discount = optional_decimal(
            &mut errors,
            "discount",
            "Discount",
            &self.discount,
            Decimal::ZERO,
        )
        .unwrap_or(Decimal::ZERO);
        if discount > Decimal::ONE_HUNDRED {
            errors.add("discount", "Discount must be at most 100");
        }

        let position = match self.position.trim() {
            "" => 0,
            raw => match raw.parse::<i32>() {
                Ok(p) if p >= 0 => p,
                _ => {
                    errors.add("position", "Position must be a whole number of 0 or more");
                    0
                }
            },
        };

        let status = choice(&mut errors, "status", "Status", &self.status);

        errors.finish(ProductDraft {
            name,
            description,
            category: CategoryId::new(category_id),
            price,
            compare_price,
            discount,
            position,
            status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_form() -> ProductForm {
        ProductForm {
            name: " Linen Shirt ".to_string(),
            category_id: "c1".to_string(),
            price: "45.00".to_string(),
            compare_price: "60".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_valid_product() {
        let draft = product_form().validate().unwrap();
        assert_eq!(draft.name, "Linen Shirt");
        assert_eq!(draft.price, Decimal::new(45, 0));
        assert_eq!(draft.compare_price, Some(Decimal::new(60, 0)));
        assert_eq!(draft.status, ProductStatus::Active);
        assert_eq!(draft.position, 0);
    }

    #[test]
    fn test_product_numeric_checks() {
        let mut form = product_form();
        form.price = "12,5".to_string();
        form.discount = "120".to_string();
        form.position = "-3".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.has("price"));
        assert!(errors.has("discount"));
        assert!(errors.has("position"));
    }

    #[test]
    fn test_compare_price_below_price() {
        let mut form = product_form();
        form.compare_price = "30".to_string();
        assert!(form.validate().unwrap_err().has("compare_price"));
    }

    #[test]
    fn test_product_requires_category() {
        let mut form = product_form();
        form.category_id = " ".to_string();
        assert_eq!(
            form.validate().unwrap_err().get("category_id"),
            Some("Category is required")
        );
    }

    #[test]
    fn test_set_by_field_name() {
        let mut form = ProductForm::default();
        form.set("price", "9".to_string());
        form.set("unknown", "x".to_string());
        assert_eq!(form.price, "9");
    }

    #[test]
    fn test_category_form() {
        let form = CategoryForm {
            name: String::new(),
            description: "x".repeat(501),
            status: "archived".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("description"));
        assert!(errors.has("status"));

        let ok = CategoryForm {
            name: "Shirts".to_string(),
            description: String::new(),
            status: "inactive".to_string(),
        };
        assert_eq!(ok.validate().unwrap().status, ActiveStatus::Inactive);
    }

    #[test]
    fn test_check_image() {
        assert!(check_image("a.png", Some("image/png"), 10).is_ok());
        let err = check_image("a.svg", Some("image/svg+xml"), 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "a.svg: only JPEG, PNG, WebP and GIF images are allowed"
        );
        assert_eq!(
            check_image("a.png", Some("image/png"), 0),
            Err(ImageError::Empty {
                file_name: "a.png".to_string()
            })
        );
        assert!(matches!(
            check_image("a.png", Some("image/png"), MAX_IMAGE_BYTES + 1),
            Err(ImageError::TooLarge { .. })
        ));
    }
}
