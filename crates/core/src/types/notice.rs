//! User-facing dialogs.
//!
//! Every page can carry one notice, rendered as a modal dialog. Business
//! failures and transport failures both end up here.

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// A dialog shown on top of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Dialog title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "Success",
            NoticeKind::Info => "Notice",
            NoticeKind::Error => "Something went wrong",
        }
    }

    /// CSS modifier for the dialog.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "dialog--success",
            NoticeKind::Info => "dialog--info",
            NoticeKind::Error => "dialog--error",
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error)
    }
}
