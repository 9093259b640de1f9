//! Promotion form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ValidationErrors, choice, optional_decimal, optional_text, required_decimal};
use crate::types::{ActiveStatus, DiscountType, PromotionCode};

/// Posted promotion form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromotionForm {
    pub code: String,
    pub description: String,
    pub discount_type: String,
    pub discount_value: String,
    pub min_order_value: String,
    pub max_discount: String,
    pub usage_limit: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
}

/// Promotion create/update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionDraft {
    pub code: PromotionCode,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_value: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ActiveStatus,
}

/// Parse a `datetime-local` (`2026-03-01T09:30`) or date-only input as UTC.
fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn required_date(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
        return None;
    }
    let parsed = parse_form_date(raw);
    if parsed.is_none() {
        errors.add(field, format!("{label} is not a valid date"));
    }
    parsed
}

impl PromotionForm {
    pub const DESCRIPTION_MAX: usize = 500;

    /// # Errors
    ///
    /// Returns every field problem found. An end date that is not strictly
    /// after the start date is reported on `end_date`.
    pub fn validate(&self) -> Result<PromotionDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let code = match PromotionCode::parse(&self.code) {
            Ok(code) => Some(code),
            Err(e) => {
                errors.add("code", capitalize(&e.to_string()));
                None
            }
        };
        let description = optional_text(
            &mut errors,
            "description",
            "Description",
            &self.description,
            Self::DESCRIPTION_MAX,
        );
        let discount_type: DiscountType =
            choice(&mut errors, "discount_type", "Discount type", &self.discount_type);

        let discount_value = required_decimal(
            &mut errors,
            "discount_value",
            "Discount value",
            &self.discount_value,
            Decimal::ZERO,
        );
        if !errors.has("discount_value") {
            if discount_value <= Decimal::ZERO {
                errors.add("discount_value", "Discount value must be greater than 0");
            } else if discount_type == DiscountType::Percent
                && discount_value > Decimal::ONE_HUNDRED
            {
                errors.add("discount_value", "A percentage discount must be at most 100");
            }
        }

        let min_order_value = optional_decimal(
            &mut errors,
            "min_order_value",
            "Minimum order value",
            &self.min_order_value,
            Decimal::ZERO,
        )
        .unwrap_or(Decimal::ZERO);
        let max_discount = optional_decimal(
            &mut errors,
            "max_discount",
            "Maximum discount",
            &self.max_discount,
            Decimal::ZERO,
        );

        let usage_limit = match self.usage_limit.trim() {
            "" => None,
            raw => raw.parse::<u32>().map_or_else(
                |_| {
                    errors.add("usage_limit", "Usage limit must be a whole number");
                    None
                },
                Some,
            ),
        };

        let start_date = required_date(&mut errors, "start_date", "Start date", &self.start_date);
        let end_date = required_date(&mut errors, "end_date", "End date", &self.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date)
            && end <= start
        {
            errors.add("end_date", "End date must be after the start date");
        }

        let status = choice(&mut errors, "status", "Status", &self.status);

        match (code, start_date, end_date) {
            (Some(code), Some(start_date), Some(end_date)) if errors.is_empty() => {
                Ok(PromotionDraft {
                    code,
                    description,
                    discount_type,
                    discount_value,
                    min_order_value,
                    max_discount,
                    usage_limit,
                    start_date,
                    end_date,
                    status,
                })
            }
            _ => Err(errors),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
