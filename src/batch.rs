//! Batch driver: sequences the fetch → validate → persist pipeline over the
//! manifest.
//!
//! Records are processed strictly sequentially within an inclusive 1-based
//! line range. Every per-record failure is absorbed here: it becomes a log
//! entry carrying the line number and URL, and the loop moves on. The only
//! fatal condition is failing to open or read the manifest itself, which
//! aborts before (or mid-) iteration.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::fetch::ImageFetcher;
use crate::manifest::parse_line;
use crate::persist::ImagePersister;
use crate::validate::ImageValidator;

/// Fatal errors that abort the whole run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The manifest file could not be opened.
    #[error("cannot open manifest {path}: {source}")]
    ManifestOpen {
        /// Path to the manifest.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file could not be read past a point.
    #[error("cannot read manifest {path}: {source}")]
    ManifestRead {
        /// Path to the manifest.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Operator-supplied bounds for one run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Whether to also crop and save the face region.
    pub crop_face: bool,
    /// First 1-based manifest line to process (line 1 is the header).
    pub start_at_line: u64,
    /// Last 1-based manifest line to process, inclusive; 0 means "through
    /// end of file".
    pub end_at_line: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            crop_face: false,
            start_at_line: 2,
            end_at_line: 0,
        }
    }
}

/// Outcome counters for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Manifest lines that entered the pipeline.
    pub processed: u64,
    /// Full images saved to disk.
    pub saved: u64,
    /// Face crops saved to disk.
    pub faces_saved: u64,
    /// Lines skipped because they did not parse.
    pub malformed: u64,
    /// Records lost to transport failures or bad statuses.
    pub fetch_failures: u64,
    /// Records rejected by content-type or digest checks.
    pub validation_failures: u64,
    /// Records that could not be written, typed, or cropped.
    pub persist_failures: u64,
}

impl BatchStats {
    /// Total records that did not produce a complete artifact.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.malformed + self.fetch_failures + self.validation_failures + self.persist_failures
    }
}

/// Sequences the per-record pipeline over the manifest.
///
/// Holds the run's collaborators, constructed once at startup and passed in
/// by value; none of them are ambient process state.
#[derive(Debug)]
pub struct BatchDriver {
    fetcher: ImageFetcher,
    validator: ImageValidator,
    persister: ImagePersister,
}

impl BatchDriver {
    /// Creates a driver over the given collaborators.
    #[must_use]
    pub fn new(fetcher: ImageFetcher, validator: ImageValidator, persister: ImagePersister) -> Self {
        Self {
            fetcher,
            validator,
            persister,
        }
    }

    /// Runs the batch over `manifest_path` within the options' line range.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] only when the manifest cannot be opened or
    /// read; every per-record failure is logged and absorbed.
    pub async fn run(
        &self,
        manifest_path: &Path,
        options: &BatchOptions,
    ) -> Result<BatchStats, BatchError> {
        let file = File::open(manifest_path)
            .await
            .map_err(|e| BatchError::ManifestOpen {
                path: manifest_path.to_path_buf(),
                source: e,
            })?;

        let mut lines = BufReader::new(file).lines();
        let mut stats = BatchStats::default();
        let mut line_number: u64 = 0;

        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|e| BatchError::ManifestRead {
                    path: manifest_path.to_path_buf(),
                    source: e,
                })?;
            let Some(line) = line else { break };
            line_number += 1;

            // Line 1 is the header, never parsed.
            if line_number == 1 {
                continue;
            }
            if options.end_at_line > 0 && line_number > options.end_at_line {
                break;
            }
            if !line_in_range(line_number, options.start_at_line, options.end_at_line) {
                continue;
            }

            self.process_line(line_number, &line, options, &mut stats)
                .await;
        }

        Ok(stats)
    }

    /// Runs one record through parse → fetch → validate → persist,
    /// absorbing every failure into a log entry and a counter.
    async fn process_line(
        &self,
        line_number: u64,
        line: &str,
        options: &BatchOptions,
        stats: &mut BatchStats,
    ) {
        stats.processed += 1;

        let record = match parse_line(line) {
            Ok(record) => record,
            Err(err) => {
                error!(line = line_number, error = %err, "skipping malformed manifest line");
                stats.malformed += 1;
                return;
            }
        };

        info!(line = line_number, url = %record.url, "downloading");

        let fetched = match self.fetcher.fetch(&record.url).await {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(line = line_number, url = %record.url, error = %err, "fetch failed");
                stats.fetch_failures += 1;
                return;
            }
        };

        if let Err(err) = self.validator.validate(&fetched, &record.sha256) {
            error!(line = line_number, url = %record.url, error = %err, "validation failed");
            stats.validation_failures += 1;
            return;
        }

        match self
            .persister
            .persist(&record, &fetched.bytes, options.crop_face)
        {
            Ok(artifact) => {
                stats.saved += 1;
                if artifact.face_path.is_some() {
                    stats.faces_saved += 1;
                }
            }
            Err(err) => {
                error!(line = line_number, url = %record.url, error = %err, "persist failed");
                stats.persist_failures += 1;
            }
        }
    }
}

/// Whether 1-based line `n` falls in the inclusive `[start, end]` range,
/// with `end == 0` meaning unbounded.
fn line_in_range(n: u64, start: u64, end: u64) -> bool {
    n >= start && (end == 0 || n <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_in_range_inclusive_bounds() {
        assert!(line_in_range(2, 2, 4));
        assert!(line_in_range(3, 2, 4));
        assert!(line_in_range(4, 2, 4));
        assert!(!line_in_range(1, 2, 4));
        assert!(!line_in_range(5, 2, 4));
    }

    #[test]
    fn test_line_in_range_zero_end_is_unbounded() {
        assert!(line_in_range(2, 2, 0));
        assert!(line_in_range(1_000_000, 2, 0));
        assert!(!line_in_range(1, 2, 0));
    }

    #[test]
    fn test_batch_options_defaults_skip_header() {
        let options = BatchOptions::default();
        assert_eq!(options.start_at_line, 2);
        assert_eq!(options.end_at_line, 0);
        assert!(!options.crop_face);
    }

    #[test]
    fn test_stats_failures_sums_all_categories() {
        let stats = BatchStats {
            processed: 10,
            saved: 4,
            faces_saved: 2,
            malformed: 1,
            fetch_failures: 2,
            validation_failures: 2,
            persist_failures: 1,
        };
        assert_eq!(stats.failures(), 6);
    }
}
