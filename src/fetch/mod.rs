//! HTTP fetch layer for manifest images.
//!
//! One shared client is configured at startup (User-Agent, timeout, retry
//! count) and used for every record. Each fetch:
//!
//! - synthesizes a `Referer` header from the target URL's origin (with the
//!   partner-site `www.` rewrite preserved verbatim),
//! - retries connection-level failures a bounded number of times,
//! - classifies every failure into the closed [`FetchError`] union,
//! - returns [`FetchedImage`] only after the body is fully in memory.
//!
//! HTTP error statuses are explicit [`FetchError::BadStatus`] outcomes, never
//! retried and never fatal for the batch.

mod client;
mod error;

pub use client::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, FetchedImage, FetcherConfig, ImageFetcher,
    default_user_agent, referer_for,
};
pub use error::FetchError;
