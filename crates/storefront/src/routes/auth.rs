//! Authentication route handlers.
//!
//! Sign-in stores the customer and their API token in the session. The guest
//! cart cookie is left untouched: while signed in the server cart is used,
//! and the guest cart comes back after sign-out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use storehouse_core::Notice;
use storehouse_core::validation::{LoginForm, RegisterForm, ValidationErrors, password};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::services::notice;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub identifier: String,
    pub errors: ValidationErrors,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub form: RegisterForm,
    pub errors: ValidationErrors,
}

/// Display login page.
#[instrument(skip(state, session, customer))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Response {
    if customer.is_some() {
        return Redirect::to("/account").into_response();
    }

    LoginTemplate {
        layout: Layout::load(&state, &session, None).await,
        identifier: String::new(),
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
    let layout = Layout::load(&state, &session, None).await;
    let identifier = form.identifier.trim().to_string();

    let (email, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return Ok(LoginTemplate {
                layout: layout.with_notice(Notice::error(errors.summary())),
                identifier,
                errors,
            }
            .into_response());
        }
    };

    let signed_in = match state.api().login(&email, &password).await {
        Ok(signed_in) => signed_in,
        Err(e) => {
            tracing::info!(error = %e, "Customer sign-in rejected");
            return Ok(LoginTemplate {
                layout: layout.with_notice(Notice::error(e.user_message())),
                identifier,
                errors: ValidationErrors::new(),
            }
            .into_response());
        }
    };

    let customer = CurrentCustomer::new(signed_in.user, &signed_in.token);
    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.id, Some(&customer.email));
    tracing::info!(customer_id = %customer.id, "Customer signed in");

    let welcome = Notice::success(format!("Welcome back, {}!", customer.name));
    notice::flash(&session, welcome).await;
    Ok(Redirect::to("/").into_response())
}

/// Display registration page.
#[instrument(skip(state, session, customer))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Response {
    if customer.is_some() {
        return Redirect::to("/account").into_response();
    }

    RegisterTemplate {
        layout: Layout::load(&state, &session, None).await,
        form: RegisterForm::default(),
        errors: ValidationErrors::new(),
    }
    .into_response()
}

/// Handle registration form submission.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let layout = Layout::load(&state, &session, None).await;

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(RegisterTemplate {
                layout: layout.with_notice(Notice::error(errors.summary())),
                form: blank_passwords(form),
                errors,
            }
            .into_response());
        }
    };

    if let Err(e) = state.api().register(&draft).await {
        tracing::info!(error = %e, "Customer sign-up rejected");
        return Ok(RegisterTemplate {
            layout: layout.with_notice(Notice::error(e.user_message())),
            form: blank_passwords(form),
            errors: ValidationErrors::new(),
        }
        .into_response());
    }

    tracing::info!(email = %draft.email, "Customer registered");
    notice::flash(
        &session,
        Notice::success("Your account has been created. Please sign in."),
    )
    .await;
    Ok(Redirect::to("/auth/login").into_response())
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

fn blank_passwords(form: RegisterForm) -> RegisterForm {
    RegisterForm {
        password: password::blank(),
        confirm_password: password::blank(),
        ..form
    }
}
