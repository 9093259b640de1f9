//! Category management.
//!
//! The API has no single-category endpoint, so the edit page looks the
//! record up in the list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use storehouse_core::validation::{CategoryForm, ValidationErrors};
use storehouse_core::{ActiveStatus, Capability, Category, CategoryId, Module, Notice};
use tower_sessions::Session;
use tracing::instrument;

use super::{Actions, Layout, SelectOption, enum_options, record_path};
use crate::error::{AppError, Result, failure_notice};
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_permission};
use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::state::AppState;

const BASE: &str = "/categories";

/// One row of the category table.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub path: String,
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub status_label: &'static str,
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            path: record_path(BASE, category.id.as_str()),
            name: category.name.clone(),
            description: category.description.clone(),
            status: category.status.as_str(),
            status_label: category.status.label(),
        }
    }
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryRow>,
    pub actions: Actions,
}

/// Category create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub form: CategoryForm,
    pub errors: ValidationErrors,
    pub statuses: Vec<SelectOption>,
}

impl CategoryFormTemplate {
    fn new(
        layout: Layout,
        editing: Option<&CategoryId>,
        form: CategoryForm,
        errors: ValidationErrors,
    ) -> Self {
        let (title, action) = match editing {
            Some(id) => ("Edit category", record_path(BASE, id.as_str())),
            None => ("New category", BASE.to_string()),
        };
        Self {
            statuses: enum_options(
                ActiveStatus::ALL,
                &form.status,
                ActiveStatus::as_str,
                ActiveStatus::label,
            ),
            layout,
            title,
            action,
            form,
            errors,
        }
    }
}

fn form_for(category: &Category) -> CategoryForm {
    CategoryForm {
        name: category.name.clone(),
        description: category.description.clone(),
        status: category.status.as_str().to_string(),
    }
}

async fn layout(session: &Session, admin: &CurrentAdmin) -> Layout {
    Layout::load(session, admin, Some(Module::Category)).await
}

/// Category list.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<CategoriesIndexTemplate> {
    require_permission(&admin, Module::Category, Capability::View)?;
    let categories = state.api().list_categories(&admin.credentials()).await?;

    Ok(CategoriesIndexTemplate {
        layout: layout(&session, &admin).await,
        categories: categories.iter().map(CategoryRow::from).collect(),
        actions: Actions::for_module(&admin, Module::Category),
    })
}

/// Empty create form.
#[instrument(skip(session, admin))]
pub async fn new(
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<CategoryFormTemplate> {
    require_permission(&admin, Module::Category, Capability::Create)?;
    Ok(CategoryFormTemplate::new(
        layout(&session, &admin).await,
        None,
        CategoryForm::default(),
        ValidationErrors::new(),
    ))
}

/// Create a category.
#[instrument(skip(state, session, admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    require_permission(&admin, Module::Category, Capability::Create)?;
    save(&state, &session, &admin, None, form).await
}

/// Edit form, filled from the category list.
#[instrument(skip(state, session, admin))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<CategoryFormTemplate> {
    require_permission(&admin, Module::Category, Capability::Update)?;
    let id = CategoryId::new(id);
    let categories = state.api().list_categories(&admin.credentials()).await?;
    let category = categories
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(CategoryFormTemplate::new(
        layout(&session, &admin).await,
        Some(&id),
        form_for(category),
        ValidationErrors::new(),
    ))
}

/// Update a category.
#[instrument(skip(state, session, admin, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    require_permission(&admin, Module::Category, Capability::Update)?;
    save(&state, &session, &admin, Some(CategoryId::new(id)), form).await
}

async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    editing: Option<CategoryId>,
    form: CategoryForm,
) -> Result<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let layout = layout(session, admin)
                .await
                .with_notice(Notice::error(errors.summary()));
            return Ok(
                CategoryFormTemplate::new(layout, editing.as_ref(), form, errors).into_response(),
            );
        }
    };

    let creds = admin.credentials();
    let result = match &editing {
        Some(id) => state.api().update_category(&creds, id, &draft).await,
        None => state.api().create_category(&creds, &draft).await,
    };

    if let Err(e) = result {
        let layout = layout(session, admin).await.with_notice(failure_notice(e)?);
        return Ok(CategoryFormTemplate::new(
            layout,
            editing.as_ref(),
            form,
            ValidationErrors::new(),
        )
        .into_response());
    }

    let message = if editing.is_some() {
        format!("Category \"{}\" was updated.", draft.name)
    } else {
        format!("Category \"{}\" was created.", draft.name)
    };
    tracing::info!(admin_id = %admin.profile.id, name = %draft.name, "Category saved");
    notice::flash(session, Notice::success(message)).await;
    Ok(Redirect::to(BASE).into_response())
}

/// Delete a category.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Category, Capability::Delete)?;
    let id = CategoryId::new(id);

    let outcome = match state.api().delete_category(&admin.credentials(), &id).await {
        Ok(()) => {
            tracing::info!(admin_id = %admin.profile.id, category_id = %id, "Category deleted");
            Notice::success("The category was deleted.")
        }
        Err(e) => failure_notice(e)?,
    };
    notice::flash(&session, outcome).await;
    Ok(Redirect::to(BASE))
}
