//! Product management.
//!
//! Create and update forms are multipart: the text fields plus any number of
//! `images` files. Images are forwarded in the order they were chosen, and
//! that order becomes their position. Rejected images block the save the
//! same way an invalid field does.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use storehouse_core::validation::{ProductForm, ValidationErrors};
use storehouse_core::{
    ApiBaseUrl, Capability, Category, Module, Notice, Price, Product, ProductId, ProductStatus,
};
use tower_sessions::Session;
use tracing::instrument;

use super::{
    Actions, Layout, Pagination, SelectOption, enum_options, record_options, record_path,
};
use crate::api::ProductListQuery;
use crate::error::{Result, failure_notice};
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_permission};
use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::services::upload::{ProductSubmission, read_product_submission};
use crate::state::AppState;

const BASE: &str = "/products";

/// One row of the product table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub path: String,
    pub name: String,
    pub image: Option<String>,
    pub category: String,
    pub price: String,
    pub compare_price: Option<String>,
    pub discount: Option<u8>,
    pub position: i32,
    pub status: &'static str,
    pub status_label: &'static str,
}

impl ProductRow {
    fn new(product: &Product, categories: &[Category], base_url: &ApiBaseUrl) -> Self {
        let category = product
            .category_name()
            .map(str::to_string)
            .or_else(|| {
                let id = product.category_id()?;
                categories
                    .iter()
                    .find(|c| &c.id == id)
                    .map(|c| c.name.clone())
            })
            .unwrap_or_default();

        Self {
            path: record_path(BASE, product.id.as_str()),
            name: product.name.clone(),
            image: product.primary_image().map(|img| base_url.asset(&img.url)),
            category,
            price: product.selling_price().display(),
            compare_price: product
                .compare_price
                .filter(|p| *p > product.price)
                .map(|p| Price::of(p).display()),
            discount: product.discount_percent(),
            position: product.position,
            status: product.status.as_str(),
            status_label: product.status.label(),
        }
    }
}

/// Product list query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub category: String,
    pub page: Option<u32>,
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRow>,
    pub categories: Vec<SelectOption>,
    pub pagination: Pagination,
    pub actions: Actions,
}

/// Product create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub errors: ValidationErrors,
    pub categories: Vec<SelectOption>,
    pub statuses: Vec<SelectOption>,
    /// Images already stored on the product, in position order.
    pub current_images: Vec<String>,
}

impl ProductFormTemplate {
    fn new(
        layout: Layout,
        editing: Option<&ProductId>,
        form: ProductForm,
        errors: ValidationErrors,
        categories: &[Category],
    ) -> Self {
        let (title, action) = match editing {
            Some(id) => ("Edit product", record_path(BASE, id.as_str())),
            None => ("New product", BASE.to_string()),
        };
        Self {
            categories: record_options(
                categories.iter().map(|c| (c.id.as_str(), c.name.as_str())),
                &form.category_id,
                "Choose a category",
            ),
            statuses: enum_options(
                ProductStatus::ALL,
                &form.status,
                ProductStatus::as_str,
                ProductStatus::label,
            ),
            layout,
            title,
            action,
            form,
            errors,
            current_images: Vec::new(),
        }
    }

    fn with_images(mut self, product: &Product, base_url: &ApiBaseUrl) -> Self {
        self.current_images = product
            .sorted_images()
            .into_iter()
            .map(|img| base_url.asset(&img.url))
            .collect();
        self
    }
}

fn form_for(product: &Product) -> ProductForm {
    ProductForm {
        name: product.name.clone(),
        description: product.description.clone(),
        category_id: product
            .category_id()
            .map(ToString::to_string)
            .unwrap_or_default(),
        price: product.price.normalize().to_string(),
        compare_price: product
            .compare_price
            .map(|p| p.normalize().to_string())
            .unwrap_or_default(),
        discount: product
            .discount
            .map(|d| d.normalize().to_string())
            .unwrap_or_default(),
        position: product.position.to_string(),
        status: product.status.as_str().to_string(),
    }
}

async fn layout(session: &Session, admin: &CurrentAdmin) -> Layout {
    Layout::load(session, admin, Some(Module::Product)).await
}

/// Product list, optionally filtered by category.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(filter): Query<ProductFilter>,
) -> Result<ProductsIndexTemplate> {
    require_permission(&admin, Module::Product, Capability::View)?;
    let creds = admin.credentials();

    let category = filter.category.trim().to_string();
    let query = ProductListQuery {
        page: filter.page.unwrap_or(1).max(1),
        category: (!category.is_empty()).then(|| category.clone()),
        ..ProductListQuery::default()
    };
    let page = state.api().list_products(&creds, &query).await?;
    let categories = state.api().list_categories(&creds).await?;

    let base = if category.is_empty() {
        format!("{BASE}?")
    } else {
        format!("{BASE}?category={}&", urlencoding::encode(&category))
    };
    let base_url = state.api().base_url();

    Ok(ProductsIndexTemplate {
        layout: layout(&session, &admin).await,
        products: page
            .items
            .iter()
            .map(|p| ProductRow::new(p, &categories, base_url))
            .collect(),
        categories: record_options(
            categories.iter().map(|c| (c.id.as_str(), c.name.as_str())),
            &category,
            "All categories",
        ),
        pagination: Pagination::new(&page, &base),
        actions: Actions::for_module(&admin, Module::Product),
    })
}

/// Empty create form.
#[instrument(skip(state, session, admin))]
pub async fn new(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<ProductFormTemplate> {
    require_permission(&admin, Module::Product, Capability::Create)?;
    let categories = state.api().list_categories(&admin.credentials()).await?;

    Ok(ProductFormTemplate::new(
        layout(&session, &admin).await,
        None,
        ProductForm::default(),
        ValidationErrors::new(),
        &categories,
    ))
}

/// Create a product.
#[instrument(skip(state, session, admin, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    require_permission(&admin, Module::Product, Capability::Create)?;
    let submission = read_product_submission(multipart).await?;
    save(&state, &session, &admin, None, submission).await
}

/// Edit form.
#[instrument(skip(state, session, admin))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<ProductFormTemplate> {
    require_permission(&admin, Module::Product, Capability::Update)?;
    let id = ProductId::new(id);
    let creds = admin.credentials();
    let product = state.api().get_product(&creds, &id).await?;
    let categories = state.api().list_categories(&creds).await?;

    Ok(ProductFormTemplate::new(
        layout(&session, &admin).await,
        Some(&id),
        form_for(&product),
        ValidationErrors::new(),
        &categories,
    )
    .with_images(&product, state.api().base_url()))
}

/// Update a product. New images are added after the existing ones.
#[instrument(skip(state, session, admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    require_permission(&admin, Module::Product, Capability::Update)?;
    let submission = read_product_submission(multipart).await?;
    save(&state, &session, &admin, Some(ProductId::new(id)), submission).await
}

async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    editing: Option<ProductId>,
    submission: ProductSubmission,
) -> Result<Response> {
    let creds = admin.credentials();

    let validated = submission.form.validate();
    let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
    submission.report_images(&mut errors);

    let draft = match validated {
        Ok(draft) if errors.is_empty() => draft,
        _ => {
            let categories = state.api().list_categories(&creds).await?;
            let layout = layout(session, admin)
                .await
                .with_notice(Notice::error(errors.summary()));
            return Ok(ProductFormTemplate::new(
                layout,
                editing.as_ref(),
                submission.form,
                errors,
                &categories,
            )
            .into_response());
        }
    };

    let image_count = submission.images.len();
    let result = match &editing {
        Some(id) => {
            state
                .api()
                .update_product(&creds, id, &draft, submission.images)
                .await
        }
        None => {
            state
                .api()
                .create_product(&creds, &draft, submission.images)
                .await
        }
    };

    if let Err(e) = result {
        let notice = failure_notice(e)?;
        let categories = state.api().list_categories(&creds).await?;
        let layout = layout(session, admin).await.with_notice(notice);
        return Ok(ProductFormTemplate::new(
            layout,
            editing.as_ref(),
            submission.form,
            ValidationErrors::new(),
            &categories,
        )
        .into_response());
    }

    let message = if editing.is_some() {
        format!("Product \"{}\" was updated.", draft.name)
    } else {
        format!("Product \"{}\" was created.", draft.name)
    };
    tracing::info!(
        admin_id = %admin.profile.id,
        name = %draft.name,
        images = image_count,
        "Product saved"
    );
    notice::flash(session, Notice::success(message)).await;
    Ok(Redirect::to(BASE).into_response())
}

/// Delete a product.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Product, Capability::Delete)?;
    let id = ProductId::new(id);

    let outcome = match state.api().delete_product(&admin.credentials(), &id).await {
        Ok(()) => {
            tracing::info!(admin_id = %admin.profile.id, product_id = %id, "Product deleted");
            Notice::success("The product was deleted.")
        }
        Err(e) => failure_notice(e)?,
    };
    notice::flash(&session, outcome).await;
    Ok(Redirect::to(BASE))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storehouse_core::{ActiveStatus, CategoryId, CategoryRef, ProductImage};

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Canvas tote".to_string(),
            description: String::new(),
            category: Some(CategoryRef::Id(CategoryId::new("c1"))),
            price: Decimal::new(2000, 2),
            compare_price: Some(Decimal::new(2500, 2)),
            discount: None,
            images: vec![
                ProductImage {
                    url: "/uploads/b.jpg".to_string(),
                    position: 1,
                    alt: None,
                },
                ProductImage {
                    url: "/uploads/a.jpg".to_string(),
                    position: 0,
                    alt: None,
                },
            ],
            status: ProductStatus::Active,
            position: 3,
            stock: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_row_resolves_category_and_primary_image() {
        let categories = vec![Category {
            id: CategoryId::new("c1"),
            name: "Bags".to_string(),
            description: String::new(),
            status: ActiveStatus::Active,
        }];
        let base = ApiBaseUrl::parse("http://localhost:5000").unwrap();

        let row = ProductRow::new(&product(), &categories, &base);
        assert_eq!(row.category, "Bags");
        assert_eq!(row.image.as_deref(), Some("http://localhost:5000/uploads/a.jpg"));
        assert_eq!(row.discount, Some(20));
    }

    #[test]
    fn test_edit_form_validates_unchanged() {
        let form = form_for(&product());
        assert_eq!(form.price, "20");
        assert_eq!(form.category_id, "c1");

        let draft = form.validate().unwrap();
        assert_eq!(draft.price, Decimal::new(2000, 2));
        assert_eq!(draft.position, 3);
    }
}
