//! Backend connection settings.

use std::time::Duration;

use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// Backend used when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpGateway`](crate::HttpGateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL every endpoint path is joined onto. Always ends with `/`.
    pub base_url: Url,
    /// Per-request timeout. Ignored on `wasm32`, where the browser owns it.
    pub timeout: Duration,
    /// `User-Agent` header for native builds.
    pub user_agent: String,
}

impl GatewayConfig {
    /// Settings for the backend at `base_url`.
    ///
    /// A base URL with a path prefix (`http://host/api`) keeps the prefix.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if the URL is malformed or cannot
    /// carry a path.
    pub fn new(base_url: &str) -> GatewayResult<Self> {
        let mut url = Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("doodle-client/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_added() {
        let config = GatewayConfig::new("http://localhost:8000").expect("config");
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/");

        let prefixed = GatewayConfig::new("http://localhost:8000/api").expect("config");
        assert_eq!(prefixed.base_url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            prefixed.base_url.join("save/").expect("join").as_str(),
            "http://localhost:8000/api/save/"
        );
    }

    #[test]
    fn test_invalid_urls_are_rejected() {
        assert!(matches!(
            GatewayConfig::new("not a url"),
            Err(GatewayError::InvalidUrl(_))
        ));
        assert!(matches!(
            GatewayConfig::new("mailto:someone@example.com"),
            Err(GatewayError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_default_points_at_local_backend() {
        let config = GatewayConfig::new(DEFAULT_BACKEND_URL).expect("config");
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let short = config.with_timeout(Duration::from_secs(2));
        assert_eq!(short.timeout, Duration::from_secs(2));
    }
}
