//! Admin sign-in and sign-out.
//!
//! A successful login stores the token under `tokenAdmin` and the returned
//! profile under `adminData`; later requests never refetch the profile, so
//! role changes take effect at the next sign-in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use storehouse_core::Notice;
use storehouse_core::validation::{LoginForm, ValidationErrors};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub username: String,
    pub errors: ValidationErrors,
}

/// Display login page.
#[instrument(skip(session, admin))]
pub async fn login_page(session: Session, OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        layout: Layout::guest(&session).await,
        username: String::new(),
        errors: ValidationErrors::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let layout = Layout::guest(&session).await;
    let username = form.identifier.trim().to_string();

    let (identifier, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return Ok(LoginTemplate {
                layout: layout.with_notice(Notice::error(errors.summary())),
                username,
                errors,
            }
            .into_response());
        }
    };

    let signed_in = match state.api().login(&identifier, &password).await {
        Ok(signed_in) => signed_in,
        Err(e) => {
            tracing::info!(username = %identifier, error = %e, "Admin sign-in rejected");
            return Ok(LoginTemplate {
                layout: layout.with_notice(Notice::error(e.user_message())),
                username,
                errors: ValidationErrors::new(),
            }
            .into_response());
        }
    };

    let admin = CurrentAdmin::new(signed_in.profile, signed_in.token);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.profile.id, &admin.profile.username);
    tracing::info!(admin_id = %admin.profile.id, "Admin signed in");

    notice::flash(
        &session,
        Notice::success(format!("Welcome, {}!", admin.profile.display_name())),
    )
    .await;
    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    notice::flash(&session, Notice::info("You have been signed out.")).await;
    Ok(Redirect::to("/auth/login"))
}
