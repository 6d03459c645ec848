//! HTTP client wrapper for fetching manifest images.
//!
//! One [`ImageFetcher`] is built at startup and shared for the whole run.
//! Each fetch issues a single GET with a synthesized `Referer` header and
//! reads the full body into memory; connection-level failures are retried a
//! bounded number of times before surfacing as a [`FetchError`].

use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use reqwest::header::REFERER;
use tracing::{debug, warn};
use url::Url;

use super::error::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Default number of extra attempts for connection-level failures.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Base delay before the first retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Cap on the backoff delay.
const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

/// Maximum jitter added to each retry delay.
const RETRY_MAX_JITTER: Duration = Duration::from_millis(250);

/// Partner-site host prefix that requires a `www.`-prefixed referer.
///
/// Dataset-specific compatibility hack inherited from the published download
/// lists; must be preserved verbatim.
const WWW_REFERER_HOST_PREFIX: &str = "fansshare";

/// Configuration for the shared HTTP client, fixed for the run's lifetime.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a connection-level failure; the CLI enforces at
    /// least 1, and the total attempt count is `1 + max_retries`.
    pub max_retries: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Default User-Agent identifying the tool.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("facegrab/{version} (dataset-download-tool)")
}

/// A fully-read successful response.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Response body, read to completion before this value exists.
    pub bytes: Vec<u8>,
    /// URL after redirects.
    pub final_url: String,
    /// Declared `Content-Type` header, when the server sent one.
    pub content_type: Option<String>,
}

/// HTTP fetcher created once at startup and shared across all records.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    max_retries: u32,
}

impl ImageFetcher {
    /// Creates a fetcher from the run configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: &FetcherConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(&config.user_agent)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            max_retries: config.max_retries,
        }
    }

    /// Fetches `url`, reading the whole body into memory.
    ///
    /// Connection-level failures (connect error, timeout) are retried up to
    /// the configured count with a short backoff; every other failure mode is
    /// returned immediately.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing the first non-retryable failure or
    /// the last retryable one once attempts are exhausted.
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let referer = referer_for(url);
        let mut attempt: u32 = 1;

        loop {
            match self.fetch_once(url, referer.as_deref()).await {
                Ok(image) => return Ok(image),
                Err(err) if err.is_connection_level() && attempt <= self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "connection-level failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Single GET attempt.
    async fn fetch_once(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<FetchedImage, FetchError> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::bad_status(url, status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_request_error(url, e))?;

        debug!(url, bytes = bytes.len(), "fetched");

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            final_url,
            content_type,
        })
    }
}

/// Synthesizes a `Referer` from the target URL's origin.
///
/// For hosts beginning with the partner prefix, the host is rewritten with a
/// leading `www.` before the referer is built. Unparseable URLs yield no
/// referer; the subsequent request surfaces its own error.
#[must_use]
pub fn referer_for(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let scheme = parsed.scheme();
    let host = parsed.host_str()?;

    let host = if host.starts_with(WWW_REFERER_HOST_PREFIX) {
        format!("www.{host}")
    } else {
        host.to_string()
    };

    Some(match parsed.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    })
}

/// Exponential backoff with jitter, in the retry style used for transient
/// transport failures.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let base_ms = RETRY_BASE_DELAY.as_millis() as u64;
    let delay_ms = base_ms.saturating_mul(1 << exponent);
    let capped_ms = delay_ms.min(RETRY_MAX_DELAY.as_millis() as u64);

    let jitter_ms = rand::thread_rng().gen_range(0..=RETRY_MAX_JITTER.as_millis() as u64);
    Duration::from_millis(capped_ms + jitter_ms)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Referer Synthesis Tests ====================

    #[test]
    fn test_referer_is_scheme_and_host() {
        assert_eq!(
            referer_for("http://example.com/path/a.jpg?x=1"),
            Some("http://example.com".to_string())
        );
    }

    #[test]
    fn test_referer_preserves_port() {
        assert_eq!(
            referer_for("http://example.com:8080/a.jpg"),
            Some("http://example.com:8080".to_string())
        );
    }

    #[test]
    fn test_referer_preserves_https_scheme() {
        assert_eq!(
            referer_for("https://cdn.example.net/img/1.png"),
            Some("https://cdn.example.net".to_string())
        );
    }

    #[test]
    fn test_referer_partner_host_gets_www_prefix() {
        assert_eq!(
            referer_for("http://fansshare.com/photos/a.jpg"),
            Some("http://www.fansshare.com".to_string())
        );
    }

    #[test]
    fn test_referer_partner_prefix_matches_subdomain_style_hosts() {
        // Prefix match, not exact-domain match: any host beginning with the
        // partner prefix is rewritten, mirroring the published behavior.
        assert_eq!(
            referer_for("http://fansshare.org/a.jpg"),
            Some("http://www.fansshare.org".to_string())
        );
    }

    #[test]
    fn test_referer_non_partner_host_unchanged() {
        assert_eq!(
            referer_for("http://myfansshare.com/a.jpg"),
            Some("http://myfansshare.com".to_string())
        );
    }

    #[test]
    fn test_referer_unparseable_url_is_none() {
        assert_eq!(referer_for("not a url"), None);
    }

    // ==================== Backoff Tests ====================

    #[test]
    fn test_backoff_grows_and_is_capped() {
        for _ in 0..20 {
            let first = backoff_delay(1);
            assert!(first >= RETRY_BASE_DELAY);
            assert!(first <= RETRY_BASE_DELAY + RETRY_MAX_JITTER);

            let late = backoff_delay(12);
            assert!(late <= RETRY_MAX_DELAY + RETRY_MAX_JITTER);
        }
    }

    #[test]
    fn test_fetcher_config_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("facegrab/"));
    }
}
