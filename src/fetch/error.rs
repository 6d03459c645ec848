//! Error types for the fetch module.
//!
//! Every transport-level failure mode is represented as a variant of the
//! closed [`FetchError`] union. Nothing at this layer panics or propagates a
//! raw `reqwest::Error`; the batch driver absorbs all of these into a
//! per-record log entry.

use thiserror::Error;

/// Errors that can occur while fetching an image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection could not be established (DNS, refused, TLS handshake).
    #[error("connection failed fetching {url}: {source}")]
    ConnectionFailed {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within the configured timeout.
    #[error("timeout fetching {url}")]
    TimedOut {
        /// The URL that timed out.
        url: String,
    },

    /// Redirect chain exceeded the client's limit.
    #[error("too many redirects fetching {url}")]
    TooManyRedirects {
        /// The URL whose redirect chain was abandoned.
        url: String,
    },

    /// Server answered with a non-2xx status code.
    #[error("HTTP {status} fetching {url}")]
    BadStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response body could not be read or decoded.
    #[error("malformed response fetching {url}: {source}")]
    MalformedResponse {
        /// The URL whose body failed to read.
        url: String,
        /// The underlying body/decode error.
        #[source]
        source: reqwest::Error,
    },

    /// Any other request failure.
    #[error("request error fetching {url}: {message}")]
    Other {
        /// The URL that failed.
        url: String,
        /// Description of the failure.
        message: String,
    },
}

impl FetchError {
    /// Creates a bad-status error.
    pub fn bad_status(url: impl Into<String>, status: u16) -> Self {
        Self::BadStatus {
            url: url.into(),
            status,
        }
    }

    /// Classifies a `reqwest` send/read error into the closed union.
    pub fn from_request_error(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::TimedOut { url }
        } else if source.is_connect() {
            Self::ConnectionFailed { url, source }
        } else if source.is_redirect() {
            Self::TooManyRedirects { url }
        } else if source.is_body() || source.is_decode() {
            Self::MalformedResponse { url, source }
        } else {
            Self::Other {
                url,
                message: source.to_string(),
            }
        }
    }

    /// Whether this failure happened at the connection level, below HTTP.
    ///
    /// Only these failures are transparently retried; HTTP error statuses
    /// are explicit outcomes and never retried.
    #[must_use]
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::TimedOut { .. })
    }
}
