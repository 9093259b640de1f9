//! Promotion management.
//!
//! The validity window is edited with `datetime-local` inputs and treated as
//! UTC. A window whose end is not after its start is rejected before the
//! API is called.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use storehouse_core::validation::{PromotionForm, ValidationErrors};
use storehouse_core::{
    ActiveStatus, Capability, DiscountType, Module, Notice, Price, Promotion, PromotionId,
};
use tower_sessions::Session;
use tracing::instrument;

use super::{Actions, Layout, SelectOption, enum_options, format_date, record_path};
use crate::error::{AppError, Result, failure_notice};
use crate::filters;
use crate::middleware::{RequireAdminAuth, require_permission};
use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::state::AppState;

const BASE: &str = "/promotions";

/// Value format of a `datetime-local` input.
const INPUT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// One row of the promotion table.
#[derive(Debug, Clone)]
pub struct PromotionRow {
    pub path: String,
    pub code: String,
    pub value: String,
    pub min_order: String,
    pub usage: String,
    pub starts: String,
    pub ends: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub running: bool,
}

impl PromotionRow {
    fn new(promotion: &Promotion, now: DateTime<Utc>) -> Self {
        let usage = match promotion.usage_limit {
            Some(limit) => format!("{} / {limit}", promotion.used_count),
            None => promotion.used_count.to_string(),
        };
        Self {
            path: record_path(BASE, promotion.id.as_str()),
            code: promotion.code.to_string(),
            value: promotion.value_label(),
            min_order: Price::of(promotion.min_order_value).display(),
            usage,
            starts: format_date(Some(promotion.start_date)),
            ends: format_date(Some(promotion.end_date)),
            status: promotion.status.as_str(),
            status_label: promotion.status.label(),
            running: promotion.is_running(now),
        }
    }
}

/// Promotion list template.
#[derive(Template, WebTemplate)]
#[template(path = "promotions/index.html")]
pub struct PromotionsIndexTemplate {
    pub layout: Layout,
    pub promotions: Vec<PromotionRow>,
    pub actions: Actions,
}

/// Promotion create/edit template.
#[derive(Template, WebTemplate)]
#[template(path = "promotions/form.html")]
pub struct PromotionFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub form: PromotionForm,
    pub errors: ValidationErrors,
    pub discount_types: Vec<SelectOption>,
    pub statuses: Vec<SelectOption>,
}

impl PromotionFormTemplate {
    fn new(
        layout: Layout,
        editing: Option<&PromotionId>,
        form: PromotionForm,
        errors: ValidationErrors,
    ) -> Self {
        let (title, action) = match editing {
            Some(id) => ("Edit promotion", record_path(BASE, id.as_str())),
            None => ("New promotion", BASE.to_string()),
        };
        Self {
            discount_types: enum_options(
                DiscountType::ALL,
                &form.discount_type,
                DiscountType::as_str,
                DiscountType::label,
            ),
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

fn form_for(promotion: &Promotion) -> PromotionForm {
    PromotionForm {
        code: promotion.code.to_string(),
        description: promotion.description.clone(),
        discount_type: promotion.discount_type.as_str().to_string(),
        discount_value: promotion.discount_value.normalize().to_string(),
        min_order_value: promotion.min_order_value.normalize().to_string(),
        max_discount: promotion
            .max_discount
            .map(|v| v.normalize().to_string())
            .unwrap_or_default(),
        usage_limit: promotion
            .usage_limit
            .map(|v| v.to_string())
            .unwrap_or_default(),
        start_date: promotion.start_date.format(INPUT_DATE_FORMAT).to_string(),
        end_date: promotion.end_date.format(INPUT_DATE_FORMAT).to_string(),
        status: promotion.status.as_str().to_string(),
    }
}

async fn layout(session: &Session, admin: &CurrentAdmin) -> Layout {
    Layout::load(session, admin, Some(Module::Promotion)).await
}

/// Promotion list.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<PromotionsIndexTemplate> {
    require_permission(&admin, Module::Promotion, Capability::View)?;
    let promotions = state.api().list_promotions(&admin.credentials()).await?;
    let now = Utc::now();

    Ok(PromotionsIndexTemplate {
        layout: layout(&session, &admin).await,
        promotions: promotions
            .iter()
            .map(|p| PromotionRow::new(p, now))
            .collect(),
        actions: Actions::for_module(&admin, Module::Promotion),
    })
}

/// Empty create form.
#[instrument(skip(session, admin))]
pub async fn new(
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<PromotionFormTemplate> {
    require_permission(&admin, Module::Promotion, Capability::Create)?;
    Ok(PromotionFormTemplate::new(
        layout(&session, &admin).await,
        None,
        PromotionForm::default(),
        ValidationErrors::new(),
    ))
}

/// Create a promotion.
#[instrument(skip(state, session, admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<PromotionForm>,
) -> Result<Response> {
    require_permission(&admin, Module::Promotion, Capability::Create)?;
    save(&state, &session, &admin, None, form).await
}

/// Edit form, filled from the promotion list.
#[instrument(skip(state, session, admin))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<PromotionFormTemplate> {
    require_permission(&admin, Module::Promotion, Capability::Update)?;
    let id = PromotionId::new(id);
    let promotions = state.api().list_promotions(&admin.credentials()).await?;
    let promotion = promotions
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("promotion {id}")))?;

    Ok(PromotionFormTemplate::new(
        layout(&session, &admin).await,
        Some(&id),
        form_for(promotion),
        ValidationErrors::new(),
    ))
}

/// Update a promotion.
#[instrument(skip(state, session, admin, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<PromotionForm>,
) -> Result<Response> {
    require_permission(&admin, Module::Promotion, Capability::Update)?;
    save(&state, &session, &admin, Some(PromotionId::new(id)), form).await
}

async fn save(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    editing: Option<PromotionId>,
    form: PromotionForm,
) -> Result<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(fields = %errors, "Promotion form rejected");
            let layout = layout(session, admin)
                .await
                .with_notice(Notice::error(errors.summary()));
            return Ok(
                PromotionFormTemplate::new(layout, editing.as_ref(), form, errors).into_response(),
            );
        }
    };

    let creds = admin.credentials();
    let result = match &editing {
        Some(id) => state.api().update_promotion(&creds, id, &draft).await,
        None => state.api().create_promotion(&creds, &draft).await,
    };

    if let Err(e) = result {
        let layout = layout(session, admin).await.with_notice(failure_notice(e)?);
        return Ok(PromotionFormTemplate::new(
            layout,
            editing.as_ref(),
            form,
            ValidationErrors::new(),
        )
        .into_response());
    }

    let message = if editing.is_some() {
        format!("Promotion {} was updated.", draft.code)
    } else {
        format!("Promotion {} was created.", draft.code)
    };
    tracing::info!(admin_id = %admin.profile.id, code = %draft.code, "Promotion saved");
    notice::flash(session, Notice::success(message)).await;
    Ok(Redirect::to(BASE).into_response())
}

/// Delete a promotion.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    require_permission(&admin, Module::Promotion, Capability::Delete)?;
    let id = PromotionId::new(id);

    let outcome = match state.api().delete_promotion(&admin.credentials(), &id).await {
        Ok(()) => {
            tracing::info!(admin_id = %admin.profile.id, promotion_id = %id, "Promotion deleted");
            Notice::success("The promotion was deleted.")
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
    use storehouse_core::PromotionCode;

    #[test]
    fn test_edit_form_round_trips_through_validation() {
        let promotion = Promotion {
            id: PromotionId::new("p1"),
            code: PromotionCode::parse("SUMMER10").unwrap(),
            description: String::new(),
            discount_type: DiscountType::Percent,
            discount_value: Decimal::new(1000, 2),
            min_order_value: Decimal::ZERO,
            max_discount: None,
            usage_limit: Some(50),
            used_count: 3,
            start_date: "2026-06-01T00:00:00Z".parse().unwrap(),
            end_date: "2026-09-01T00:00:00Z".parse().unwrap(),
            status: ActiveStatus::Active,
        };

        let form = form_for(&promotion);
        assert_eq!(form.start_date, "2026-06-01T00:00");
        assert_eq!(form.discount_value, "10");

        let draft = form.validate().unwrap();
        assert_eq!(draft.start_date, promotion.start_date);
        assert_eq!(draft.end_date, promotion.end_date);
        assert_eq!(draft.usage_limit, Some(50));
    }
}
