//! Form validation run before any API call.
//!
//! Each form has a raw input struct (deserialized straight from the posted
//! form, every field a string) and a draft struct (the typed request body).
//! `validate()` turns one into the other or returns every problem found so
//! the form can be re-rendered with messages next to the fields.

mod access;
mod catalog;
mod checkout;
mod customer;
mod order;
pub mod password;
mod promotion;

pub use access::{AccountDraft, AccountForm, RoleDraft, RoleForm};
pub use catalog::{
    ALLOWED_IMAGE_TYPES, CategoryDraft, CategoryForm, ImageError, MAX_IMAGE_BYTES, ProductDraft,
    ProductForm, check_image,
};
pub use checkout::{CheckoutDraft, CheckoutForm};
pub use customer::{LoginForm, RegisterDraft, RegisterForm};
pub use order::status_change;
pub use promotion::{PromotionDraft, PromotionForm};

use rust_decimal::Decimal;

/// One problem with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// All messages in one line, for dialogs.
    #[must_use]
    pub fn summary(&self) -> String {
        join_messages(&self.errors)
    }

    /// `Ok(value)` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one problem was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trimmed required text with a length cap.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
    } else if value.chars().count() > max {
        errors.add(field, format!("{label} must be at most {max} characters"));
    }
    value.to_string()
}

/// Trimmed optional text with a length cap.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max: usize,
) -> String {
    let value = value.trim();
    if value.chars().count() > max {
        errors.add(field, format!("{label} must be at most {max} characters"));
    }
    value.to_string()
}

/// Required number, at least `min`.
pub(crate) fn required_decimal(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: Decimal,
) -> Decimal {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
        return Decimal::ZERO;
    }
    match value.parse::<Decimal>() {
        Ok(number) if number < min => {
            errors.add(field, format!("{label} must be at least {min}"));
            number
        }
        Ok(number) => number,
        Err(_) => {
            errors.add(field, format!("{label} must be a number"));
            Decimal::ZERO
        }
    }
}

/// Optional number, at least `min` when present.
pub(crate) fn optional_decimal(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: Decimal,
) -> Option<Decimal> {
    if value.trim().is_empty() {
        None
    } else {
        Some(required_decimal(errors, field, label, value, min))
    }
}

/// Parse a wire enum posted by a `<select>`.
pub(crate) fn choice<T: std::str::FromStr + Default>(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
) -> T {
    let value = value.trim();
    if value.is_empty() {
        return T::default();
    }
    value.parse().unwrap_or_else(|_| {
        errors.add(field, format!("{label} is not a valid choice"));
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_problem() {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", "Name", "   ", 10);
        let price = required_decimal(&mut errors, "price", "Price", "abc", Decimal::ZERO);
        assert_eq!(name, "");
        assert_eq!(price, Decimal::ZERO);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("price"), Some("Price must be a number"));
        assert_eq!(errors.summary(), "Name is required; Price must be a number");
        assert_eq!(errors.to_string(), errors.summary());
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_length_and_minimum() {
        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "name", "Name", "abcdefghijk", 10);
        required_decimal(&mut errors, "price", "Price", "-1", Decimal::ZERO);
        assert!(errors.has("name"));
        assert_eq!(errors.get("price"), Some("Price must be at least 0"));
    }

    #[test]
    fn test_optional_decimal_blank_is_none() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            optional_decimal(&mut errors, "x", "X", "  ", Decimal::ZERO),
            None
        );
        assert!(errors.is_empty());
    }
}
