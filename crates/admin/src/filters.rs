//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Longest description shown in a table cell.
const EXCERPT_CHARS: usize = 80;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens long text for table cells.
///
/// Usage in templates: `{{ role.description|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string()))
}

fn shorten(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("  short  "), "short");

        let long = "x".repeat(100);
        let short = shorten(&long);
        assert_eq!(short.chars().count(), EXCERPT_CHARS);
        assert!(short.ends_with('…'));
    }
}
