//! Checkout form.

use serde::{Deserialize, Serialize};

use super::{ValidationErrors, choice, optional_text, required_text};
use crate::types::{Email, PaymentMethod, PromotionCode, ShippingContact};

/// Posted checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment_method: String,
    pub promotion_code: String,
    pub note: String,
}

/// The validated part of an order request; the cart lines are added by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    #[serde(rename = "shippingInfo")]
    pub shipping: ShippingContact,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<PromotionCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CheckoutForm {
    pub const NAME_MAX: usize = 100;
    pub const ADDRESS_MAX: usize = 300;
    pub const NOTE_MAX: usize = 500;
    pub const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 7..=15;

    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<CheckoutDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let full_name = required_text(
            &mut errors,
            "full_name",
            "Full name",
            &self.full_name,
            Self::NAME_MAX,
        );
        let address = required_text(
            &mut errors,
            "address",
            "Address",
            &self.address,
            Self::ADDRESS_MAX,
        );

        let email = match Email::parse(&self.email) {
            Ok(email) => email.into_inner(),
            Err(e) => {
                errors.add("email", format!("Email: {e}"));
                String::new()
            }
        };

        let phone = self.phone.trim().to_string();
        if phone.is_empty() {
            errors.add("phone", "Phone is required");
        } else {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            let allowed = |c: char| c.is_ascii_digit() || " +-().".contains(c);
            if !phone.chars().all(allowed) || !Self::PHONE_DIGITS.contains(&digits) {
                errors.add("phone", "Phone must be a number of 7 to 15 digits");
            }
        }

        let payment_method = choice(
            &mut errors,
            "payment_method",
            "Payment method",
            &self.payment_method,
        );

        let promotion_code = if self.promotion_code.trim().is_empty() {
            None
        } else {
            match PromotionCode::parse(&self.promotion_code) {
                Ok(code) => Some(code),
                Err(e) => {
                    errors.add("promotion_code", format!("Promotion code: {e}"));
                    None
                }
            }
        };

        let note = optional_text(&mut errors, "note", "Note", &self.note, Self::NOTE_MAX);

        errors.finish(CheckoutDraft {
            shipping: ShippingContact {
                full_name,
                email,
                phone,
                address,
            },
            payment_method,
            promotion_code,
            note: (!note.is_empty()).then_some(note),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            full_name: "Jane Doe".to_string(),
            email: "JANE@example.com".to_string(),
            phone: "+1 (555) 010-2030".to_string(),
            address: "1 Main St".to_string(),
            payment_method: "bank_transfer".to_string(),
            promotion_code: " spring26 ".to_string(),
            note: String::new(),
        }
    }

    #[test]
    fn test_valid_checkout() {
        let draft = form().validate().unwrap();
        assert_eq!(draft.shipping.email, "jane@example.com");
        assert_eq!(draft.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(draft.promotion_code.unwrap().as_str(), "SPRING26");
        assert_eq!(draft.note, None);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(form().validate().unwrap()).unwrap();
        assert_eq!(json["shippingInfo"]["fullName"], "Jane Doe");
        assert_eq!(json["paymentMethod"], "bank_transfer");
        assert_eq!(json["promotionCode"], "SPRING26");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_contact_required() {
        let errors = CheckoutForm::default().validate().unwrap_err();
        for field in ["full_name", "email", "phone", "address"] {
            assert!(errors.has(field), "{field}");
        }
    }

    #[test]
    fn test_phone_and_code_checks() {
        let mut bad = form();
        bad.phone = "12ab".to_string();
        bad.promotion_code = "x!".to_string();
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("phone"));
        assert!(errors.has("promotion_code"));
    }
}
