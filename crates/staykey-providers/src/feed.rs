//! Calendar feed retrieval.
//!
//! A feed is any URL serving a text/calendar document over plain GET. The
//! [`FeedSource`] trait keeps the reconciliation engine ignorant of where
//! the text comes from; [`HttpFeedSource`] is the production implementation,
//! [`StaticFeedSource`] serves canned documents for tests and dry runs.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, trace};

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

/// Retrieves a remote calendar document.
pub trait FeedSource: Send + Sync {
    /// Returns the name of this source (for logs).
    fn name(&self) -> &str;

    /// Fetches the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failures, timeouts, and non-OK
    /// statuses. A timeout fails like any other provider error; the caller
    /// decides whether that is fatal.
    fn fetch(&self, url: &str) -> BoxFuture<'_, ProviderResult<String>>;
}

/// Configuration for [`HttpFeedSource`].
#[derive(Debug, Clone)]
pub struct FeedFetcherConfig {
    /// Per-request timeout. A slow upstream must not stall the caller.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for FeedFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("staykey/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FeedFetcherConfig {
    /// Builder: set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP implementation of [`FeedSource`].
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    /// Creates a new HTTP feed source with the given configuration.
    pub fn new(config: FeedFetcherConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }
}

impl FeedSource for HttpFeedSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: &str) -> BoxFuture<'_, ProviderResult<String>> {
        let url = url.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            trace!(url = %url, "fetching calendar feed");

            let response = client.get(&url).send().await.map_err(|e| {
                let message = if e.is_timeout() {
                    format!("feed fetch timed out: {e}")
                } else {
                    format!("feed fetch failed: {e}")
                };
                ProviderError::network(message).with_vendor("feed")
            })?;

            let status = response.status();
            debug!(url = %url, status = %status, "feed response");

            match status {
                StatusCode::OK => response.text().await.map_err(|e| {
                    ProviderError::network(format!("failed to read feed body: {e}"))
                        .with_vendor("feed")
                }),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                    ProviderError::authentication("feed URL rejected the request")
                        .with_vendor("feed"),
                ),
                StatusCode::NOT_FOUND => {
                    Err(ProviderError::not_found("feed URL not found").with_vendor("feed"))
                }
                StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::rate_limited(
                    "feed host throttled the request",
                )
                .with_vendor("feed")),
                s if s.is_server_error() => Err(ProviderError::server(format!(
                    "feed host returned {s}"
                ))
                .with_vendor("feed")),
                s => Err(ProviderError::invalid_response(format!(
                    "unexpected feed status {s}"
                ))
                .with_vendor("feed")),
            }
        })
    }
}

/// A feed source serving canned documents from memory.
///
/// Useful for tests and offline dry runs: unknown URLs fail with a
/// not-found error, mirroring the HTTP behavior.
#[derive(Debug, Default)]
pub struct StaticFeedSource {
    documents: HashMap<String, String>,
}

impl StaticFeedSource {
    /// Creates an empty static source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document under a URL.
    #[must_use]
    pub fn with_document(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(url.into(), content.into());
        self
    }

    /// Registers a document under a URL on an existing source.
    pub fn insert(&mut self, url: impl Into<String>, content: impl Into<String>) {
        self.documents.insert(url.into(), content.into());
    }
}

impl FeedSource for StaticFeedSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, url: &str) -> BoxFuture<'_, ProviderResult<String>> {
        let result = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("no document for {url}")));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = FeedFetcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("staykey/"));
    }

    #[test]
    fn http_source_creation() {
        let source = HttpFeedSource::new(
            FeedFetcherConfig::default().with_timeout(Duration::from_secs(10)),
        );
        assert!(source.is_ok());
        assert_eq!(source.unwrap().name(), "http");
    }

    #[tokio::test]
    async fn static_source_serves_documents() {
        let source = StaticFeedSource::new()
            .with_document("https://example.com/a.ics", "BEGIN:VCALENDAR\nEND:VCALENDAR");

        let body = source.fetch("https://example.com/a.ics").await.unwrap();
        assert!(body.contains("VCALENDAR"));
    }

    #[tokio::test]
    async fn static_source_misses_are_not_found() {
        let source = StaticFeedSource::new();
        let err = source.fetch("https://example.com/missing.ics").await.unwrap_err();
        assert_eq!(err.code(), crate::ProviderErrorCode::NotFound);
    }
}
