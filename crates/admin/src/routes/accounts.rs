//! Admin account management.
//!
//! Passwords are required when creating an account and optional when
//! editing one; a blank password keeps the current one. The password field
//! is never filled back into a rendered form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use storehouse_core::validation::{AccountForm, ValidationErrors, password};
use storehouse_core::{
    AccountStatus, AdminAccount, AdminAccountId, Capability, Module, Notice, Role,
};
use tower_sessions::Session;
use tracing::instrument;

use super::{Actions, Layout, SelectOption, enum_options, record_options, record_path};
use crate::error::{AppError, Result, failure_notice};
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_permission};
use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::state::AppState;

const BASE: &str = "/accounts";

/// One row of the account table.
#[derive(Debug, Clone)]
pub struct AccountRow {
    pub path: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub is_self: bool,
}

impl AccountRow {
    fn new(account: &AdminAccount, roles: &[Role], admin: &CurrentAdmin) -> Self {
        // The list may carry only the role id; resolve it from the role list.
        let role = account
            .role
            .as_ref()
            .map(|role| {
                role.name()
                    .map(str::to_string)
                    .or_else(|| {
                        roles
                            .iter()
                            .find(|r| &r.id == role.id())
                            .map(|r| r.name.clone())
                    })
                    .unwrap_or_else(|| role.id().to_string())
            })
            .unwrap_or_default();

        Self {
            path: record_path(BASE, account.id.as_str()),
            username: account.username.clone(),
            full_name: account.full_name.clone(),
            email: account.email.clone().unwrap_or_default(),
            role,
            status: account.status.as_str(),
            status_label: account.status.label(),
            is_self: account.id == admin.profile.id,
        }
    }
}

/// Account list template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/index.html")]
pub struct AccountsIndexTemplate {
    pub layout: Layout,
    pub accounts: Vec<AccountRow>,
    pub actions: Actions,
}

/// Account create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/form.html")]
pub struct AccountFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub is_create: bool,
    pub form: AccountForm,
    pub errors: ValidationErrors,
    pub roles: Vec<SelectOption>,
    pub statuses: Vec<SelectOption>,
}

impl AccountFormTemplate {
    fn new(
        layout: Layout,
        editing: Option<&AdminAccountId>,
        form: AccountForm,
        errors: ValidationErrors,
        roles: &[Role],
    ) -> Self {
        let (title, action) = match editing {
            Some(id) => ("Edit account", record_path(BASE, id.as_str())),
            None => ("New account", BASE.to_string()),
        };
        let form = AccountForm {
            password: password::blank(),
            ..form
        };
        Self {
            roles: record_options(
                roles.iter().map(|r| (r.id.as_str(), r.name.as_str())),
                &form.role_id,
                "Choose a role",
            ),
            statuses: enum_options(
                AccountStatus::ALL,
                &form.status,
                AccountStatus::as_str,
                AccountStatus::label,
            ),
            layout,
            title,
            action,
            is_create: editing.is_none(),
            form,
            errors,
        }
    }
}

fn form_for(account: &AdminAccount) -> AccountForm {
    AccountForm {
        username: account.username.clone(),
        password: password::blank(),
        full_name: account.full_name.clone(),
        email: account.email.clone().unwrap_or_default(),
        role_id: account
            .role
            .as_ref()
            .map(|r| r.id().to_string())
            .unwrap_or_default(),
        status: account.status.as_str().to_string(),
    }
}

async fn layout(session: &Session, admin: &CurrentAdmin) -> Layout {
    Layout::load(session, admin, Some(Module::Account)).await
}

/// Account list.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<AccountsIndexTemplate> {
    require_permission(&admin, Module::Account, Capability::View)?;
    let creds = admin.credentials();
    let accounts = state.api().list_accounts(&creds).await?;
    let roles = state.api().list_roles(&creds).await?;

    Ok(AccountsIndexTemplate {
        layout: layout(&session, &admin).await,
        accounts: accounts
            .iter()
            .map(|a| AccountRow::new(a, &roles, &admin))
            .collect(),
        actions: Actions::for_module(&admin, Module::Account),
    })
}

/// Empty create form.
#[instrument(skip(state, session, admin))]
pub async fn new(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<AccountFormTemplate> {
    require_permission(&admin, Module::Account, Capability::Create)?;
    let roles = state.api().list_roles(&admin.credentials()).await?;
    Ok(AccountFormTemplate::new(
        layout(&session, &admin).await,
        None,
        AccountForm::default(),
        ValidationErrors::new(),
        &roles,
    ))
}

/// Create an account.
#[instrument(skip(state, session, admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    require_permission(&admin, Module::Account, Capability::Create)?;
    save(&state, &session, &admin, None, form).await
}

/// Edit form, filled from the account list.
#[instrument(skip(state, session, admin))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<AccountFormTemplate> {
    require_permission(&admin, Module::Account, Capability::Update)?;
    let id = AdminAccountId::new(id);
    let creds = admin.credentials();
    let accounts = state.api().list_accounts(&creds).await?;
    let account = accounts
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| AppError::NotFound(format!("account {id}")))?;
    let roles = state.api().list_roles(&creds).await?;

    Ok(AccountFormTemplate::new(
        layout(&session, &admin).await,
        Some(&id),
        form_for(account),
        ValidationErrors::new(),
        &roles,
    ))
}

/// Update an account.
#[instrument(skip(state, session, admin, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    require_permission(&admin, Module::Account, Capability::Update)?;
    save(&state, &session, &admin, Some(AdminAccountId::new(id)), form).await
}

async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    editing: Option<AdminAccountId>,
    form: AccountForm,
) -> Result<Response> {
    let creds = admin.credentials();

    let draft = match form.validate(editing.is_none()) {
        Ok(draft) => draft,
        Err(errors) => {
            let roles = state.api().list_roles(&creds).await?;
            let layout = layout(session, admin)
                .await
                .with_notice(Notice::error(errors.summary()));
            return Ok(
                AccountFormTemplate::new(layout, editing.as_ref(), form, errors, &roles)
                    .into_response(),
            );
        }
    };

    let result = match &editing {
        Some(id) => state.api().update_account(&creds, id, &draft).await,
        None => state.api().create_account(&creds, &draft).await,
    };

    if let Err(e) = result {
        let notice = failure_notice(e)?;
        let roles = state.api().list_roles(&creds).await?;
        let layout = layout(session, admin).await.with_notice(notice);
        return Ok(AccountFormTemplate::new(
            layout,
            editing.as_ref(),
            form,
            ValidationErrors::new(),
            &roles,
        )
        .into_response());
    }

    let message = if editing.is_some() {
        format!("Account \"{}\" was updated.", draft.username)
    } else {
        format!("Account \"{}\" was created.", draft.username)
    };
    tracing::info!(admin_id = %admin.profile.id, username = %draft.username, "Account saved");
    notice::flash(session, Notice::success(message)).await;
    Ok(Redirect::to(BASE).into_response())
}

/// Delete an account. Admins cannot delete themselves.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Account, Capability::Delete)?;
    let id = AdminAccountId::new(id);

    let outcome = if id == admin.profile.id {
        Notice::error("You cannot delete the account you are signed in with.")
    } else {
        match state.api().delete_account(&admin.credentials(), &id).await {
            Ok(()) => {
                tracing::info!(admin_id = %admin.profile.id, account_id = %id, "Account deleted");
                Notice::success("The account was deleted.")
            }
            Err(e) => failure_notice(e)?,
        }
    };
    notice::flash(&session, outcome).await;
    Ok(Redirect::to(BASE))
}
