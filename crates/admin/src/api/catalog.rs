//! Products and categories.
//!
//! Product writes are multipart: the draft's fields go as text parts and the
//! images follow as `images` file parts in upload order, which the server
//! turns into their `position`.

use std::fmt;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use storehouse_core::validation::{CategoryDraft, ProductDraft};
use storehouse_core::{Category, CategoryId, Page, Product, ProductId};
use tracing::instrument;

use super::{AdminApi, ApiError, Credentials, Listing, Stamped, item_path, required};

const PRODUCTS: &str = "/admin/product";
const CATEGORIES: &str = "/admin/product/category";

/// One uploaded image, already checked.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Query for the admin product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
}

impl Default for ProductListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            category: None,
        }
    }
}

impl ProductListQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

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

/// Build the multipart body for a product write.
///
/// # Errors
///
/// Fails if the draft does not serialize to an object or an image has an
/// unusable content type.
fn product_form<B: Serialize>(body: &B, images: Vec<ImageUpload>) -> Result<Form, ApiError> {
    let fields = match serde_json::to_value(body) {
        Ok(serde_json::Value::Object(fields)) => fields,
        Ok(_) => return Err(ApiError::Decode("product body is not an object".to_string())),
        Err(e) => return Err(ApiError::Decode(e.to_string())),
    };

    let mut form = Form::new();
    for (name, value) in fields {
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        form = form.text(name, text);
    }

    for image in images {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        form = form.part("images", part);
    }

    Ok(form)
}

impl AdminApi {
    /// `GET /admin/product`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds))]
    pub async fn list_products(
        &self,
        creds: &Credentials,
        query: &ProductListQuery,
    ) -> Result<Page<Product>, ApiError> {
        let listing: Option<Listing<Product>> =
            self.get(PRODUCTS, &query.to_params(), creds).await?;
        Ok(Listing::page_or_empty(listing))
    }

    /// `GET /admin/product/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the product is missing.
    #[instrument(skip(self, creds), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        creds: &Credentials,
        id: &ProductId,
    ) -> Result<Product, ApiError> {
        let product = self.get(&item_path(PRODUCTS, id.as_str()), &[], creds).await?;
        required(product, "product")
    }

    /// `POST /admin/product` (multipart).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(
        skip(self, creds, draft, images),
        fields(name = %draft.name, images = images.len())
    )]
    pub async fn create_product(
        &self,
        creds: &Credentials,
        draft: &ProductDraft,
        images: Vec<ImageUpload>,
    ) -> Result<(), ApiError> {
        let form = product_form(&Stamped::created(draft, creds), images)?;
        let _: Option<serde_json::Value> = self
            .send_multipart(reqwest::Method::POST, PRODUCTS, form, creds)
            .await?;
        Ok(())
    }

    /// `PUT /admin/product/{id}` (multipart). New images are appended after
    /// the existing ones.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(
        skip(self, creds, draft, images),
        fields(product_id = %id, images = images.len())
    )]
    pub async fn update_product(
        &self,
        creds: &Credentials,
        id: &ProductId,
        draft: &ProductDraft,
        images: Vec<ImageUpload>,
    ) -> Result<(), ApiError> {
        let form = product_form(&Stamped::updated(draft, creds), images)?;
        let _: Option<serde_json::Value> = self
            .send_multipart(
                reqwest::Method::PUT,
                &item_path(PRODUCTS, id.as_str()),
                form,
                creds,
            )
            .await?;
        Ok(())
    }

    /// `DELETE /admin/product/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        creds: &Credentials,
        id: &ProductId,
    ) -> Result<(), ApiError> {
        self.delete(&item_path(PRODUCTS, id.as_str()), creds).await
    }

    /// `GET /admin/product/category`: every category, active or not.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds))]
    pub async fn list_categories(&self, creds: &Credentials) -> Result<Vec<Category>, ApiError> {
        let listing: Option<Listing<Category>> = self.get(CATEGORIES, &[], creds).await?;
        Ok(Listing::page_or_empty(listing).items)
    }

    /// `POST /admin/product/category`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(name = %draft.name))]
    pub async fn create_category(
        &self,
        creds: &Credentials,
        draft: &CategoryDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::POST,
                CATEGORIES,
                &Stamped::created(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `PUT /admin/product/category/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        creds: &Credentials,
        id: &CategoryId,
        draft: &CategoryDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::PUT,
                &item_path(CATEGORIES, id.as_str()),
                &Stamped::updated(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `DELETE /admin/product/category/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        creds: &Credentials,
        id: &CategoryId,
    ) -> Result<(), ApiError> {
        self.delete(&item_path(CATEGORIES, id.as_str()), creds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = ProductListQuery {
            page: 3,
            category: Some(String::new()),
            ..ProductListQuery::default()
        };
        assert_eq!(
            query.to_params(),
            vec![("page", "3".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn test_product_form_rejects_bad_mime() {
        let image = ImageUpload {
            file_name: "a.png".to_string(),
            content_type: "not a mime".to_string(),
            bytes: vec![1, 2, 3],
        };
        let body = serde_json::json!({"name": "Cap"});
        assert!(product_form(&body, vec![image]).is_err());
    }

    #[test]
    fn test_product_form_requires_object() {
        assert!(matches!(
            product_form(&[1, 2], Vec::new()),
            Err(ApiError::Decode(_))
        ));
    }
}
