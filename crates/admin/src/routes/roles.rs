//! Role management.
//!
//! Every permission checkbox posts under the same `permissions` name with a
//! `module:capability` value, so the form body is read as raw pairs.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use storehouse_core::validation::{RoleForm, ValidationErrors};
use storehouse_core::{ActiveStatus, Capability, Module, Notice, Role, RoleId};
use tower_sessions::Session;
use tracing::instrument;

use super::{Actions, Layout, SelectOption, enum_options, record_path};
use crate::error::{AppError, Result, failure_notice};
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_permission};
use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::state::AppState;

const BASE: &str = "/roles";

/// One checkbox of the permission matrix.
#[derive(Debug, Clone)]
pub struct PermissionCell {
    pub key: String,
    pub label: &'static str,
    pub checked: bool,
}

/// One module row of the permission matrix.
#[derive(Debug, Clone)]
pub struct PermissionRow {
    pub module: &'static str,
    pub cells: Vec<PermissionCell>,
}

/// Build the matrix with `selected` keys checked.
fn permission_matrix(selected: &[String]) -> Vec<PermissionRow> {
    Module::ALL
        .iter()
        .map(|&module| PermissionRow {
            module: module.label(),
            cells: Capability::ALL
                .iter()
                .map(|&capability| {
                    let key = format!("{module}:{capability}");
                    PermissionCell {
                        checked: selected.contains(&key),
                        key,
                        label: capability.label(),
                    }
                })
                .collect(),
        })
        .collect()
}

/// One row of the role table.
#[derive(Debug, Clone)]
pub struct RoleRow {
    pub path: String,
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub status_label: &'static str,
    /// e.g. "Products: View, Create"
    pub grants: Vec<String>,
}

impl From<&Role> for RoleRow {
    fn from(role: &Role) -> Self {
        Self {
            path: record_path(BASE, role.id.as_str()),
            name: role.name.clone(),
            description: role.description.clone(),
            status: role.status.as_str(),
            status_label: role.status.label(),
            grants: role
                .permissions
                .iter()
                .filter(|p| !p.capabilities.is_empty())
                .map(|p| {
                    let capabilities: Vec<&str> =
                        p.capabilities.iter().map(|c| c.label()).collect();
                    format!("{}: {}", p.module.label(), capabilities.join(", "))
                })
                .collect(),
        }
    }
}

/// Role list template.
#[derive(Template, WebTemplate)]
#[template(path = "roles/index.html")]
pub struct RolesIndexTemplate {
    pub layout: Layout,
    pub roles: Vec<RoleRow>,
    pub actions: Actions,
}

/// Role create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "roles/form.html")]
pub struct RoleFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub form: RoleForm,
    pub errors: ValidationErrors,
    pub statuses: Vec<SelectOption>,
    pub matrix: Vec<PermissionRow>,
}

impl RoleFormTemplate {
    fn new(
        layout: Layout,
        editing: Option<&RoleId>,
        form: RoleForm,
        errors: ValidationErrors,
    ) -> Self {
        let (title, action) = match editing {
            Some(id) => ("Edit role", record_path(BASE, id.as_str())),
            None => ("New role", BASE.to_string()),
        };
        Self {
            statuses: enum_options(
                ActiveStatus::ALL,
                &form.status,
                ActiveStatus::as_str,
                ActiveStatus::label,
            ),
            matrix: permission_matrix(&form.permissions),
            layout,
            title,
            action,
            form,
            errors,
        }
    }
}

fn form_for(role: &Role) -> RoleForm {
    RoleForm {
        name: role.name.clone(),
        description: role.description.clone(),
        status: role.status.as_str().to_string(),
        permissions: role.permission_keys(),
    }
}

async fn layout(session: &Session, admin: &CurrentAdmin) -> Layout {
    Layout::load(session, admin, Some(Module::Role)).await
}

/// Role list.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<RolesIndexTemplate> {
    require_permission(&admin, Module::Role, Capability::View)?;
    let roles = state.api().list_roles(&admin.credentials()).await?;

    Ok(RolesIndexTemplate {
        layout: layout(&session, &admin).await,
        roles: roles.iter().map(RoleRow::from).collect(),
        actions: Actions::for_module(&admin, Module::Role),
    })
}

/// Empty create form.
#[instrument(skip(session, admin))]
pub async fn new(
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<RoleFormTemplate> {
    require_permission(&admin, Module::Role, Capability::Create)?;
    Ok(RoleFormTemplate::new(
        layout(&session, &admin).await,
        None,
        RoleForm::default(),
        ValidationErrors::new(),
    ))
}

/// Create a role.
#[instrument(skip(state, session, admin, pairs))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    require_permission(&admin, Module::Role, Capability::Create)?;
    save(&state, &session, &admin, None, RoleForm::from_pairs(pairs)).await
}

/// Edit form, filled from the role list.
#[instrument(skip(state, session, admin))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<RoleFormTemplate> {
    require_permission(&admin, Module::Role, Capability::Update)?;
    let id = RoleId::new(id);
    let roles = state.api().list_roles(&admin.credentials()).await?;
    let role = roles
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound(format!("role {id}")))?;

    Ok(RoleFormTemplate::new(
        layout(&session, &admin).await,
        Some(&id),
        form_for(role),
        ValidationErrors::new(),
    ))
}

/// Update a role.
#[instrument(skip(state, session, admin, pairs))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    require_permission(&admin, Module::Role, Capability::Update)?;
    save(
        &state,
        &session,
        &admin,
        Some(RoleId::new(id)),
        RoleForm::from_pairs(pairs),
    )
    .await
}

async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    editing: Option<RoleId>,
    form: RoleForm,
) -> Result<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let layout = layout(session, admin)
                .await
                .with_notice(Notice::error(errors.summary()));
            return Ok(
                RoleFormTemplate::new(layout, editing.as_ref(), form, errors).into_response(),
            );
        }
    };

    let creds = admin.credentials();
    let result = match &editing {
        Some(id) => state.api().update_role(&creds, id, &draft).await,
        None => state.api().create_role(&creds, &draft).await,
    };

    if let Err(e) = result {
        let layout = layout(session, admin).await.with_notice(failure_notice(e)?);
        return Ok(
            RoleFormTemplate::new(layout, editing.as_ref(), form, ValidationErrors::new())
                .into_response(),
        );
    }

    let message = if editing.is_some() {
        format!("Role \"{}\" was updated.", draft.name)
    } else {
        format!("Role \"{}\" was created.", draft.name)
    };
    tracing::info!(admin_id = %admin.profile.id, name = %draft.name, "Role saved");
    notice::flash(session, Notice::success(message)).await;
    Ok(Redirect::to(BASE).into_response())
}

/// Delete a role.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Role, Capability::Delete)?;
    let id = RoleId::new(id);

    let outcome = match state.api().delete_role(&admin.credentials(), &id).await {
        Ok(()) => {
            tracing::info!(admin_id = %admin.profile.id, role_id = %id, "Role deleted");
            Notice::success("The role was deleted.")
        }
        Err(e) => failure_notice(e)?,
    };
    notice::flash(&session, outcome).await;
    Ok(Redirect::to(BASE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_matrix_checks_selected() {
        let matrix = permission_matrix(&["order:view".to_string(), "order:update".to_string()]);
        assert_eq!(matrix.len(), Module::ALL.len());

        let orders = matrix.iter().find(|row| row.module == "Orders");
        let checked: Vec<&str> = orders
            .map(|row| {
                row.cells
                    .iter()
                    .filter(|c| c.checked)
                    .map(|c| c.key.as_str())
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(checked, vec!["order:view", "order:update"]);
    }
}
