//! Order tracking for guests.
//!
//! The customer asks for a code by email, types it in, and sees every order
//! placed with that email. The current step lives in the session so a page
//! reload keeps the customer where they were.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use storehouse_core::Notice;
use storehouse_core::tracking::{OTP_VALIDITY_MINUTES, TrackingError, TrackingStep};
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use super::account::OrderView;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::state::AppState;

/// Email form data.
#[derive(Debug, Deserialize)]
pub struct OtpRequestForm {
    #[serde(default)]
    pub email: String,
}

/// Code form data.
#[derive(Debug, Deserialize)]
pub struct OtpEntryForm {
    #[serde(default)]
    pub otp: String,
}

/// Tracking page template, one section per step.
#[derive(Template, WebTemplate)]
#[template(path = "track/index.html")]
pub struct TrackTemplate {
    pub layout: Layout,
    pub step: &'static str,
    pub email: String,
    pub orders: Vec<OrderView>,
    pub validity_minutes: u32,
}

impl TrackTemplate {
    fn new(layout: Layout, step: &TrackingStep) -> Self {
        let name = match step {
            TrackingStep::AwaitingOtpRequest => "request",
            TrackingStep::AwaitingOtpEntry { .. } | TrackingStep::ResultsShown { .. } => "entry",
        };
        Self {
            layout,
            step: name,
            email: step.email().map(ToString::to_string).unwrap_or_default(),
            orders: Vec::new(),
            validity_minutes: OTP_VALIDITY_MINUTES,
        }
    }
}

async fn load_step(session: &Session) -> TrackingStep {
    session
        .get::<TrackingStep>(session_keys::TRACKING)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save_step(session: &Session, step: &TrackingStep) -> Result<()> {
    session.insert(session_keys::TRACKING, step).await?;
    Ok(())
}

/// Display the current tracking step.
///
/// Results are not kept in the session; reloading the results step shows the
/// code form again for the same email.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> impl IntoResponse {
    let layout = Layout::load(&state, &session, customer.as_ref()).await;
    let step = load_step(&session).await;
    TrackTemplate::new(layout, &step)
}

/// Ask the server to email a code.
#[instrument(skip(state, session, customer, form))]
pub async fn request_otp(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<OtpRequestForm>,
) -> Result<Response> {
    let layout = Layout::load(&state, &session, customer.as_ref()).await;

    let email = match TrackingStep::validate_email(&form.email) {
        Ok(email) => email,
        Err(e) => {
            let mut page = TrackTemplate::new(
                layout.with_notice(Notice::error(e.to_string())),
                &TrackingStep::AwaitingOtpRequest,
            );
            page.email = form.email.trim().to_string();
            return Ok(page.into_response());
        }
    };

    if let Err(e) = state.api().request_tracking_otp(&email).await {
        tracing::warn!(error = %e, "Tracking code request failed");
        let mut page = TrackTemplate::new(
            layout.with_notice(Notice::error(e.user_message())),
            &TrackingStep::AwaitingOtpRequest,
        );
        page.email = email.to_string();
        return Ok(page.into_response());
    }

    let message = format!(
        "We sent a code to {email}. It expires in {OTP_VALIDITY_MINUTES} minutes."
    );
    let step = TrackingStep::otp_sent(email);
    save_step(&session, &step).await?;

    Ok(TrackTemplate::new(layout.with_notice(Notice::success(message)), &step).into_response())
}

/// Submit the emailed code and show the orders it unlocks.
#[instrument(skip(state, session, customer, form))]
pub async fn lookup(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<OtpEntryForm>,
) -> Result<Response> {
    let layout = Layout::load(&state, &session, customer.as_ref()).await;
    let step = load_step(&session).await;

    let submission = match step.submit_otp(&form.otp) {
        Ok(submission) => submission,
        Err(e @ (TrackingError::EmptyOtp | TrackingError::NoPendingRequest)) => {
            let layout = layout.with_notice(Notice::error(e.to_string()));
            return Ok(TrackTemplate::new(layout, &step).into_response());
        }
        Err(e @ TrackingError::InvalidEmail(_)) => {
            let page = TrackTemplate::new(
                layout.with_notice(Notice::error(e.to_string())),
                &TrackingStep::AwaitingOtpRequest,
            );
            return Ok(page.into_response());
        }
    };

    let orders = match state.api().track_orders(&submission).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::warn!(error = %e, "Order lookup failed");
            let layout = layout.with_notice(Notice::error(e.user_message()));
            return Ok(TrackTemplate::new(layout, &step).into_response());
        }
    };

    if orders.is_empty() {
        let notice = Notice::info(format!("No orders were found for {}.", submission.email));
        return Ok(TrackTemplate::new(layout.with_notice(notice), &step).into_response());
    }

    let step = step.results_shown();
    save_step(&session, &step).await?;

    let base_url = state.api().base_url();
    let mut page = TrackTemplate::new(layout, &step);
    page.step = "results";
    page.orders = orders.iter().map(|o| OrderView::new(o, base_url)).collect();
    Ok(page.into_response())
}

/// Start over from the email step.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Redirect> {
    save_step(&session, &TrackingStep::back()).await?;
    Ok(Redirect::to("/track"))
}
