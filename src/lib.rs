//! facegrab core library
//!
//! One-shot batch pipeline that downloads the FaceScrub face-image dataset
//! from a tab-separated manifest, validating and typing every payload before
//! it is persisted.
//!
//! # Architecture
//!
//! - [`manifest`] - manifest line parsing
//! - [`fetch`] - shared HTTP client, referer synthesis, retry policy
//! - [`sniff`] - content-type sniffing capabilities
//! - [`validate`] - MIME and SHA-256 payload checks
//! - [`persist`] - two-phase artifact writes and face cropping
//! - [`batch`] - the sequential line-range driver tying it together
//! - [`logging`] - console + logfile tracing setup

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod fetch;
pub mod logging;
pub mod manifest;
pub mod persist;
pub mod sniff;
pub mod validate;

// Re-export commonly used types
pub use batch::{BatchDriver, BatchError, BatchOptions, BatchStats};
pub use fetch::{FetchError, FetchedImage, FetcherConfig, ImageFetcher};
pub use manifest::{BoundingBox, ManifestError, ManifestRecord, parse_line};
pub use persist::{ImagePersister, PersistError, PersistedArtifact};
pub use sniff::{ContentSniffer, SniffedType};
pub use validate::{ImageValidator, ValidationError, sha256_hex};
