//! Flash notices carried across a redirect.

use storehouse_core::Notice;
use tower_sessions::Session;

use crate::models::session_keys;

/// Queue a notice for the next rendered page.
pub async fn flash(session: &Session, notice: Notice) {
    if let Err(e) = session.insert(session_keys::NOTICE, notice).await {
        tracing::error!("Failed to store notice in session: {e}");
    }
}

/// Take the pending notice, if any.
pub async fn take(session: &Session) -> Option<Notice> {
    session
        .remove::<Notice>(session_keys::NOTICE)
        .await
        .ok()
        .flatten()
}
