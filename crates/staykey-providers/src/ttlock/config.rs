//! TTLock adapter configuration.

use std::time::Duration;

/// Default vendor API base for European accounts.
pub const DEFAULT_API_URL: &str = "https://euapi.ttlock.com";

/// Configuration for the TTLock client.
///
/// Built explicitly and passed into [`TtlockClient::new`]; nothing reads the
/// process environment behind the caller's back.
///
/// [`TtlockClient::new`]: super::TtlockClient::new
#[derive(Debug, Clone)]
pub struct TtlockConfig {
    /// OAuth client id issued by the vendor.
    pub client_id: String,
    /// OAuth client secret issued by the vendor.
    pub client_secret: String,
    /// Redirect URI registered with the vendor, needed for the OAuth flow.
    pub redirect_uri: Option<String>,
    /// API base URL.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TtlockConfig {
    /// Creates a configuration with the given credentials and defaults.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Reads the configuration from `TTLOCK_CLIENT_ID`,
    /// `TTLOCK_CLIENT_SECRET`, and optional `TTLOCK_REDIRECT_URI` /
    /// `TTLOCK_API_URL`.
    ///
    /// Returns `None` when either credential is absent, which callers treat
    /// as "no lock vendor in this deployment".
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("TTLOCK_CLIENT_ID").ok()?;
        let client_secret = std::env::var("TTLOCK_CLIENT_SECRET").ok()?;

        let mut config = Self::new(client_id, client_secret);
        if let Ok(uri) = std::env::var("TTLOCK_REDIRECT_URI") {
            config.redirect_uri = Some(uri);
        }
        if let Ok(url) = std::env::var("TTLOCK_API_URL") {
            config.api_url = url;
        }
        Some(config)
    }

    /// Builder: set the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Builder: set the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Builder: set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true when both credentials are non-empty.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TtlockConfig::new("id", "secret");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.redirect_uri.is_none());
        assert!(config.has_credentials());
    }

    #[test]
    fn empty_credentials_detected() {
        assert!(!TtlockConfig::new("", "secret").has_credentials());
        assert!(!TtlockConfig::new("id", "").has_credentials());
    }

    #[test]
    fn builders() {
        let config = TtlockConfig::new("id", "secret")
            .with_redirect_uri("https://app.example.com/locks/callback")
            .with_api_url("https://api.ttlock.test")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(
            config.redirect_uri.as_deref(),
            Some("https://app.example.com/locks/callback")
        );
        assert_eq!(config.api_url, "https://api.ttlock.test");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
