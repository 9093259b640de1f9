//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from the API as plain numbers in the shop currency. They are
//! kept as [`Decimal`] so line totals and discounts never drift through
//! floating point.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Price in the default shop currency.
    #[must_use]
    pub fn of(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount.round_dp(2))
    }

    /// Total for `quantity` units after a percentage discount.
    #[must_use]
    pub fn line_total(&self, quantity: u32, discount_percent: Decimal) -> Self {
        let gross = self.amount.saturating_mul(Decimal::from(quantity));
        let rate =
            discount_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED;
        let off = gross.saturating_mul(rate);
        Self::new((gross - off).round_dp(2), self.currency_code)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Whole-number discount percentage between a selling price and the
/// compare-at price, if the compare-at price is higher.
#[must_use]
pub fn discount_percent(price: Decimal, compare_price: Option<Decimal>) -> Option<u8> {
    let compare = compare_price.filter(|c| *c > price && *c > Decimal::ZERO)?;
    let pct = ((compare - price) * Decimal::ONE_HUNDRED / compare).round();
    pct.to_u8().filter(|p| *p > 0)
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        let price = Price::of(Decimal::new(19_999, 3));
        assert_eq!(price.display(), "$20.00");
        assert_eq!(Price::of(Decimal::new(5, 0)).display(), "$5.00");
    }

    #[test]
    fn test_line_total_applies_discount() {
        let price = Price::of(Decimal::new(2_000, 2));
        let total = price.line_total(3, Decimal::new(10, 0));
        assert_eq!(total.amount, Decimal::new(5_400, 2));
    }

    #[test]
    fn test_line_total_clamps_discount() {
        let price = Price::of(Decimal::new(10, 0));
        assert_eq!(price.line_total(2, Decimal::new(150, 0)).amount, Decimal::ZERO);
    }

    #[test]
    fn test_line_total_saturates_instead_of_overflowing() {
        let price = Price::of(Decimal::MAX);
        assert_eq!(price.line_total(3, Decimal::ZERO).amount, Decimal::MAX);
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(
            discount_percent(Decimal::new(75, 0), Some(Decimal::new(100, 0))),
            Some(25)
        );
        assert_eq!(discount_percent(Decimal::new(100, 0), Some(Decimal::new(90, 0))), None);
        assert_eq!(discount_percent(Decimal::new(100, 0), None), None);
    }
}
