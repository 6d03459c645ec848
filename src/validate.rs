//! Payload validation: content type and digest verification.
//!
//! A fetched payload is accepted only when it is recognizably an image and
//! its SHA-256 matches the manifest's expected digest. The digest check is
//! the integrity guarantee against substituted content and manifest drift;
//! a mismatch is permanent for a given response and never retried.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::fetch::FetchedImage;
use crate::sniff::ContentSniffer;

/// Reasons a fetched payload is rejected.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Neither the sniffer nor the response headers yielded a content type.
    #[error("missing content type for {url}")]
    MissingContentType {
        /// URL the payload came from.
        url: String,
    },

    /// The resolved content type is not in the `image` family.
    #[error("invalid content type '{content_type}' for {url}")]
    NotAnImage {
        /// URL the payload came from.
        url: String,
        /// The content type that was resolved.
        content_type: String,
    },

    /// SHA-256 of the payload differs from the manifest digest.
    #[error("SHA-256 mismatch for {url}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// URL the payload came from.
        url: String,
        /// Digest declared in the manifest.
        expected: String,
        /// Digest computed over the payload.
        actual: String,
    },
}

/// Validates fetched payloads against the manifest's expectations.
#[derive(Debug, Clone, Copy)]
pub struct ImageValidator {
    sniffer: ContentSniffer,
}

impl ImageValidator {
    /// Creates a validator using the given sniffing capability.
    #[must_use]
    pub fn new(sniffer: ContentSniffer) -> Self {
        Self { sniffer }
    }

    /// Accepts the payload iff its content type starts with `image` and its
    /// SHA-256 equals `expected_sha256`.
    ///
    /// The content type is sniffed from the bytes; when the sniffer does not
    /// recognize them, the response's declared `Content-Type` header is used
    /// instead. An absent type is a rejection, not a crash.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first failing check.
    pub fn validate(
        &self,
        image: &FetchedImage,
        expected_sha256: &str,
    ) -> Result<(), ValidationError> {
        let content_type = self
            .sniffer
            .mime_type(&image.bytes)
            .map(str::to_string)
            .or_else(|| image.content_type.clone())
            .ok_or_else(|| ValidationError::MissingContentType {
                url: image.final_url.clone(),
            })?;

        if !content_type.starts_with("image") {
            return Err(ValidationError::NotAnImage {
                url: image.final_url.clone(),
                content_type,
            });
        }

        let actual = sha256_hex(&image.bytes);
        if actual != expected_sha256.to_ascii_lowercase() {
            return Err(ValidationError::DigestMismatch {
                url: image.final_url.clone(),
                expected: expected_sha256.to_string(),
                actual,
            });
        }

        Ok(())
    }
}

/// SHA-256 of `bytes` as lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
