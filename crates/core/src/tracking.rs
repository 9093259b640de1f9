//! Steps of the OTP-gated order lookup.
//!
//! ```text
//! AwaitingOtpRequest --otp sent--> AwaitingOtpEntry --orders found--> ResultsShown
//!          ^                              |                               |
//!          +------------- back -----------+-------------------------------+
//! ```
//!
//! The server emails a time-boxed code and enforces its expiry; this side
//! only checks that a code was entered at all.

use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError};

/// How long the emailed code stays valid, as told to the customer.
pub const OTP_VALIDITY_MINUTES: u32 = 5;

/// Errors raised before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    #[error("Please enter a valid email address ({0})")]
    InvalidEmail(#[from] EmailError),
    #[error("Please enter the code we emailed you")]
    EmptyOtp,
    #[error("Request a code first")]
    NoPendingRequest,
}

/// Where the customer is in the lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TrackingStep {
    #[default]
    AwaitingOtpRequest,
    AwaitingOtpEntry {
        email: Email,
    },
    ResultsShown {
        email: Email,
    },
}

/// A validated `{email, otp}` pair ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpSubmission {
    pub email: Email,
    pub otp: String,
}

impl TrackingStep {
    /// Validate the email typed on the first step.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidEmail`] for malformed addresses.
    pub fn validate_email(raw: &str) -> Result<Email, TrackingError> {
        Ok(Email::parse(raw)?)
    }

    /// The server accepted the OTP request for `email`.
    #[must_use]
    pub const fn otp_sent(email: Email) -> Self {
        Self::AwaitingOtpEntry { email }
    }

    /// Validate the code typed on the second step.
    ///
    /// Codes are accepted on the results step too, so a customer can look up
    /// again with a fresh code without going back.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::NoPendingRequest`] on the first step and
    /// [`TrackingError::EmptyOtp`] for a blank code.
    pub fn submit_otp(&self, otp: &str) -> Result<OtpSubmission, TrackingError> {
        let email = self.email().ok_or(TrackingError::NoPendingRequest)?;
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(TrackingError::EmptyOtp);
        }
        Ok(OtpSubmission {
            email: email.clone(),
            otp: otp.to_string(),
        })
    }

    /// Orders were returned for the submitted code.
    #[must_use]
    pub fn results_shown(self) -> Self {
        match self {
            Self::AwaitingOtpEntry { email } | Self::ResultsShown { email } => {
                Self::ResultsShown { email }
            }
            Self::AwaitingOtpRequest => Self::AwaitingOtpRequest,
        }
    }

    /// Manual return to the first step.
    #[must_use]
    pub const fn back() -> Self {
        Self::AwaitingOtpRequest
    }

    /// Email the current lookup is for.
    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        match self {
            Self::AwaitingOtpRequest => None,
            Self::AwaitingOtpEntry { email } | Self::ResultsShown { email } => Some(email),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("ada@example.com").unwrap()
    }

    #[test]
    fn test_happy_path() {
        let step = TrackingStep::otp_sent(email());
        let submission = step.submit_otp(" 123456 ").unwrap();
        assert_eq!(submission.otp, "123456");
        assert_eq!(submission.email, email());

        let step = step.results_shown();
        assert_eq!(step, TrackingStep::ResultsShown { email: email() });
        assert_eq!(TrackingStep::back(), TrackingStep::AwaitingOtpRequest);
    }

    #[test]
    fn test_empty_otp_rejected() {
        let step = TrackingStep::otp_sent(email());
        assert_eq!(step.submit_otp("   "), Err(TrackingError::EmptyOtp));
    }

    #[test]
    fn test_otp_requires_pending_request() {
        assert_eq!(
            TrackingStep::AwaitingOtpRequest.submit_otp("123456"),
            Err(TrackingError::NoPendingRequest)
        );
    }

    #[test]
    fn test_invalid_email() {
        assert!(matches!(
            TrackingStep::validate_email("nope"),
            Err(TrackingError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_step_serializes_with_tag() {
        let json = serde_json::to_value(TrackingStep::otp_sent(email())).unwrap();
        assert_eq!(json["step"], "awaiting_otp_entry");
        assert_eq!(json["email"], "ada@example.com");
    }
}
