//! iPay adapter configuration.

use std::time::Duration;

/// Default vendor API base.
pub const DEFAULT_API_URL: &str = "https://ipay.ge/opay/api";

/// Configuration for the iPay client.
///
/// Built explicitly and passed into [`IpayClient::new`]; nothing reads the
/// process environment behind the caller's back.
///
/// [`IpayClient::new`]: super::IpayClient::new
#[derive(Debug, Clone)]
pub struct IpayConfig {
    /// Merchant identifier issued by the vendor.
    pub merchant_id: String,
    /// Shared secret used for request signing.
    pub secret_key: String,
    /// API base URL.
    pub api_url: String,
    /// URL the vendor calls back with the payment result.
    pub callback_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl IpayConfig {
    /// Creates a configuration with the given credentials and defaults.
    pub fn new(merchant_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            secret_key: secret_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            callback_url: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Reads the configuration from `IPAY_MERCHANT_ID`, `IPAY_SECRET_KEY`,
    /// and optional `IPAY_API_URL` / `IPAY_CALLBACK_URL`.
    ///
    /// Returns `None` when either credential is absent, which callers treat
    /// as "no payment vendor in this deployment".
    pub fn from_env() -> Option<Self> {
        let merchant_id = std::env::var("IPAY_MERCHANT_ID").ok()?;
        let secret_key = std::env::var("IPAY_SECRET_KEY").ok()?;

        let mut config = Self::new(merchant_id, secret_key);
        if let Ok(url) = std::env::var("IPAY_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("IPAY_CALLBACK_URL") {
            config.callback_url = Some(url);
        }
        Some(config)
    }

    /// Builder: set the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Builder: set the callback URL.
    #[must_use]
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
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
        !self.merchant_id.is_empty() && !self.secret_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IpayConfig::new("merchant-1", "secret-1");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.callback_url.is_none());
        assert!(config.has_credentials());
    }

    #[test]
    fn empty_credentials_detected() {
        assert!(!IpayConfig::new("", "secret").has_credentials());
        assert!(!IpayConfig::new("merchant", "").has_credentials());
    }

    #[test]
    fn builders() {
        let config = IpayConfig::new("m", "s")
            .with_api_url("https://sandbox.ipay.test/api")
            .with_callback_url("https://app.example.com/payments/callback")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.api_url, "https://sandbox.ipay.test/api");
        assert_eq!(
            config.callback_url.as_deref(),
            Some("https://app.example.com/payments/callback")
        );
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
