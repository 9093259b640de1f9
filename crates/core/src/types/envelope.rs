//! Response envelope used by every API endpoint.
//!
//! The API wraps payloads as `{ "success": bool, "message": "...", "data": ... }`.
//! A `success: false` envelope is an expected business failure whose message
//! is safe to show to the user.

use serde::{Deserialize, Serialize};

/// Envelope around an API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the server accepted the request. Missing means accepted.
    #[serde(default = "accepted")]
    pub success: bool,
    /// Server-supplied message (human-readable).
    pub message: Option<String>,
    /// Payload, absent on most failures and on some mutations.
    pub data: Option<T>,
}

const fn accepted() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Split the envelope into the payload or the server's failure message.
    ///
    /// # Errors
    ///
    /// Returns the server message (or a generic one) when `success` is false.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "The request could not be completed".to_string()))
        }
    }
}

/// One page of a listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

const fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// A page that holds every item of a non-paginated listing.
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        let limit = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            items,
            total,
            page: 1,
            limit,
        }
    }

    /// Number of pages for the reported total.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.limit)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_yields_message() {
        let env: ApiEnvelope<u32> =
            serde_json::from_str(r#"{"success":false,"message":"Code expired"}"#)
                .unwrap_or_else(|_| ApiEnvelope { success: true, message: None, data: None });
        assert_eq!(env.into_result(), Err("Code expired".to_string()));
    }

    #[test]
    fn test_missing_success_means_accepted() {
        let env: Option<ApiEnvelope<u32>> = serde_json::from_str(r#"{"data":7}"#).ok();
        assert_eq!(env.map(ApiEnvelope::into_result), Some(Ok(Some(7))));
    }

    #[test]
    fn test_blank_failure_message_is_replaced() {
        let env = ApiEnvelope::<()> {
            success: false,
            message: Some("  ".to_string()),
            data: None,
        };
        assert!(env.into_result().is_err_and(|m| !m.trim().is_empty()));
    }

    #[test]
    fn test_page_math() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 25,
            page: 2,
            limit: 10,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(!Page::single(vec![1]).has_next());
    }
}
