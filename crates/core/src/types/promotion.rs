//! Promotion codes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::PromotionId;
use super::price::Price;
use super::status::{ActiveStatus, DiscountType};

/// Errors that can occur when parsing a [`PromotionCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromotionCodeError {
    #[error("promotion code is required")]
    Empty,
    #[error("promotion code must be {min}-{max} characters")]
    Length { min: usize, max: usize },
    #[error("promotion code may only contain letters and digits")]
    Charset,
}

/// A promotion code, always upper-case.
///
/// ```
/// use storehouse_core::PromotionCode;
///
/// let code = PromotionCode::parse(" summer25 ").unwrap();
/// assert_eq!(code.as_str(), "SUMMER25");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionCode(String);

impl PromotionCode {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 20;

    /// Trim, upper-case and validate user input.
    ///
    /// # Errors
    ///
    /// Returns an error when the code is empty, outside 3-20 characters, or
    /// contains anything but ASCII letters and digits.
    pub fn parse(raw: &str) -> Result<Self, PromotionCodeError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(PromotionCodeError::Empty);
        }
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&code.chars().count()) {
            return Err(PromotionCodeError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PromotionCodeError::Charset);
        }
        Ok(Self(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PromotionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A promotion as returned by the admin promotion endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(alias = "_id")]
    pub id: PromotionId,
    pub code: PromotionCode,
    #[serde(default)]
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_order_value: Decimal,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ActiveStatus,
}

impl Promotion {
    /// Whether the promotion can be applied at `now`.
    #[must_use]
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.status == ActiveStatus::Active
            && self.start_date <= now
            && now < self.end_date
            && self.usage_limit.is_none_or(|limit| self.used_count < limit)
    }

    /// Amount taken off an order worth `order_value`.
    ///
    /// Zero below the minimum order value; percentage discounts are capped by
    /// `max_discount`; never more than the order itself.
    #[must_use]
    pub fn discount_for(&self, order_value: Decimal) -> Decimal {
        if order_value < self.min_order_value || order_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let raw = match self.discount_type {
            DiscountType::Percent => {
                let off = order_value * self.discount_value / Decimal::ONE_HUNDRED;
                self.max_discount.map_or(off, |cap| off.min(cap))
            }
            DiscountType::Amount => self.discount_value,
        };
        raw.min(order_value).max(Decimal::ZERO).round_dp(2)
    }

    /// "10%" or "$5.00".
    #[must_use]
    pub fn value_label(&self) -> String {
        match self.discount_type {
            DiscountType::Percent => format!("{}%", self.discount_value.normalize()),
            DiscountType::Amount => Price::of(self.discount_value).display(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn promotion(discount_type: DiscountType, value: i64) -> Promotion {
        Promotion {
            id: PromotionId::new("pr1"),
            code: PromotionCode::parse("SAVE10").unwrap(),
            description: String::new(),
            discount_type,
            discount_value: Decimal::new(value, 0),
            min_order_value: Decimal::new(50, 0),
            max_discount: Some(Decimal::new(15, 0)),
            usage_limit: Some(2),
            used_count: 1,
            start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            status: ActiveStatus::Active,
        }
    }

    #[test]
    fn test_code_parse() {
        assert_eq!(
            PromotionCode::parse("ab").unwrap_err(),
            PromotionCodeError::Length { min: 3, max: 20 }
        );
        assert_eq!(PromotionCode::parse("  ").unwrap_err(), PromotionCodeError::Empty);
        assert_eq!(PromotionCode::parse("SAVE-10").unwrap_err(), PromotionCodeError::Charset);
        assert_eq!(PromotionCode::parse("save10").unwrap().as_str(), "SAVE10");
    }

    #[test]
    fn test_percent_discount_is_capped() {
        let promo = promotion(DiscountType::Percent, 10);
        assert_eq!(promo.discount_for(Decimal::new(100, 0)), Decimal::new(10, 0));
        assert_eq!(promo.discount_for(Decimal::new(400, 0)), Decimal::new(15, 0));
        assert_eq!(promo.discount_for(Decimal::new(40, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_amount_discount_never_exceeds_order() {
        let mut promo = promotion(DiscountType::Amount, 80);
        promo.min_order_value = Decimal::ZERO;
        assert_eq!(promo.discount_for(Decimal::new(60, 0)), Decimal::new(60, 0));
    }

    #[test]
    fn test_is_running() {
        let promo = promotion(DiscountType::Percent, 10);
        let inside = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(promo.is_running(inside));
        assert!(!promo.is_running(after));

        let mut used_up = promo;
        used_up.used_count = 2;
        assert!(!used_up.is_running(inside));
    }

    #[test]
    fn test_value_label() {
        assert_eq!(promotion(DiscountType::Percent, 10).value_label(), "10%");
        assert_eq!(promotion(DiscountType::Amount, 5).value_label(), "$5.00");
    }
}
