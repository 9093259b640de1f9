//! Base URL of the remote REST API.
//!
//! The URL comes from one environment variable with a fallback. Ports that
//! browsers refuse to connect to (the Fetch standard's "bad ports") are
//! rejected: pages link to API-hosted images, so an API on such a port would
//! half-work in production.

use std::fmt;

use url::Url;

/// Fallback API location used when nothing usable is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Ports browsers block for HTTP(S) fetches.
pub const BLOCKED_PORTS: &[u16] = &[
    1, 7, 9, 11, 13, 15, 17, 19, 20, 21, 22, 23, 25, 37, 42, 43, 53, 69, 77, 79, 87, 95, 101, 102,
    103, 104, 109, 110, 111, 113, 115, 117, 119, 123, 135, 137, 139, 143, 161, 179, 389, 427, 465,
    512, 513, 514, 515, 526, 530, 531, 532, 540, 548, 554, 556, 563, 587, 601, 636, 989, 990, 993,
    995, 1719, 1720, 1723, 2049, 3659, 4045, 4190, 5060, 5061, 6000, 6566, 6665, 6666, 6667, 6668,
    6669, 6679, 6697, 10080,
];

/// Errors that make a configured API URL unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiUrlError {
    #[error("invalid API URL: {0}")]
    Invalid(String),
    #[error("API URL must use http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("API URL port {0} is blocked by browsers")]
    BlockedPort(u16),
}

/// A validated API base URL without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBaseUrl(Url);

impl ApiBaseUrl {
    /// Parse and validate a base URL.
    ///
    /// # Errors
    ///
    /// Returns an error for unparsable URLs, non-HTTP schemes, and ports on
    /// the browser denylist.
    pub fn parse(raw: &str) -> Result<Self, ApiUrlError> {
        let url = Url::parse(raw.trim()).map_err(|e| ApiUrlError::Invalid(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiUrlError::UnsupportedScheme(url.scheme().to_string()));
        }

        if let Some(port) = url.port_or_known_default()
            && BLOCKED_PORTS.contains(&port)
        {
            return Err(ApiUrlError::BlockedPort(port));
        }

        Ok(Self(url))
    }

    /// Resolve the configured value, falling back to [`DEFAULT_API_URL`].
    ///
    /// Returns the URL to use and, when the configured value was rejected,
    /// the reason so the caller can log it.
    ///
    /// # Panics
    ///
    /// Never in practice: the fallback is a literal that always parses.
    #[must_use]
    pub fn resolve(configured: Option<&str>) -> (Self, Option<ApiUrlError>) {
        let fallback = || Self::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL is a valid URL");

        match configured.map(str::trim).filter(|s| !s.is_empty()) {
            None => (fallback(), None),
            Some(raw) => match Self::parse(raw) {
                Ok(url) => (url, None),
                Err(e) => (fallback(), Some(e)),
            },
        }
    }

    /// Full URL for an API path such as `/api/product`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Absolute URL for an uploaded asset. Paths the server returns relative
    /// (`/uploads/a.jpg`) are served from the API origin; absolute URLs pass
    /// through.
    #[must_use]
    pub fn asset(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        self.endpoint(path)
    }

    /// The underlying URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ApiBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_http_urls() {
        let url = ApiBaseUrl::parse("https://api.example.com/").ok();
        assert_eq!(
            url.map(|u| u.endpoint("/api/product")).as_deref(),
            Some("https://api.example.com/api/product")
        );
    }

    #[test]
    fn test_parse_keeps_path_prefix() {
        let url = ApiBaseUrl::parse("http://example.com:8080/v1").ok();
        assert_eq!(
            url.map(|u| u.endpoint("admin/role")).as_deref(),
            Some("http://example.com:8080/v1/admin/role")
        );
    }

    #[test]
    fn test_parse_rejects_blocked_port() {
        assert_eq!(
            ApiBaseUrl::parse("http://localhost:6667"),
            Err(ApiUrlError::BlockedPort(6667))
        );
    }

    #[test]
    fn test_asset_urls() {
        let (base, _) = ApiBaseUrl::resolve(Some("http://api.example.com:5000"));
        assert_eq!(
            base.asset("/uploads/a.jpg"),
            "http://api.example.com:5000/uploads/a.jpg"
        );
        assert_eq!(
            base.asset("https://cdn.example.com/b.png"),
            "https://cdn.example.com/b.png"
        );
    }

    #[test]
    fn test_parse_rejects_scheme() {
        assert!(matches!(
            ApiBaseUrl::parse("ftp://example.com"),
            Err(ApiUrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_resolve_falls_back() {
        let (url, err) = ApiBaseUrl::resolve(None);
        assert_eq!(url.to_string(), DEFAULT_API_URL);
        assert!(err.is_none());

        let (url, err) = ApiBaseUrl::resolve(Some("http://localhost:10080"));
        assert_eq!(url.to_string(), DEFAULT_API_URL);
        assert_eq!(err, Some(ApiUrlError::BlockedPort(10080)));

        let (url, err) = ApiBaseUrl::resolve(Some("http://api.internal:4000"));
        assert_eq!(url.to_string(), "http://api.internal:4000");
        assert!(err.is_none());
    }
}
