//! CLI argument definitions using clap derive macros.
//!
//! Flag spellings use underscores (`--crop_face`, `--max_retries`, ...) to
//! stay compatible with the published FaceScrub download instructions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use facegrab::fetch::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use facegrab::sniff::ContentSniffer;

/// Batch download and verify the FaceScrub face-image dataset.
///
/// Reads a tab-separated manifest, fetches each image over HTTP, validates
/// status, MIME type, and SHA-256 digest, and saves full images (and
/// optionally cropped faces) under the dataset directory.
#[derive(Parser, Debug)]
#[command(name = "facegrab")]
#[command(author, version, about)]
pub struct Args {
    /// FaceScrub data file, e.g. actors_users_normal_bbox.txt
    pub inputfile: PathBuf,

    /// Directory to save images under
    pub datasetpath: PathBuf,

    /// Also crop and save face images
    #[arg(long = "crop_face")]
    pub crop_face: bool,

    /// Seconds to wait before a request times out (must be > 0)
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = parse_timeout)]
    pub timeout: f64,

    /// Extra attempts for connection-level failures (must be >= 1)
    #[arg(long = "max_retries", default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: u32,

    /// File to log operations to, alongside the console
    #[arg(short = 'l', long, default_value = "download.log")]
    pub logfile: PathBuf,

    /// First 1-based manifest line to process (line 1 is the header)
    #[arg(long = "start_at_line", default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub start_at_line: u64,

    /// Last manifest line to process, inclusive (0 = through end of file)
    #[arg(long = "end_at_line", default_value_t = 0)]
    pub end_at_line: u64,

    /// User-Agent header sent with every request
    #[arg(long = "user_agent")]
    pub user_agent: Option<String>,

    /// Content-sniffing capability used for typing downloaded bytes
    #[arg(long, value_enum, default_value_t = SnifferChoice::Deep)]
    pub sniffer: SnifferChoice,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error console output
    #[arg(short, long)]
    pub quiet: bool,
}

/// CLI spelling of the [`ContentSniffer`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnifferChoice {
    /// Magic-byte signature table only.
    Signature,
    /// Signature table plus decoder-level format guessing.
    Deep,
}

impl From<SnifferChoice> for ContentSniffer {
    fn from(choice: SnifferChoice) -> Self {
        match choice {
            SnifferChoice::Signature => ContentSniffer::Signature,
            SnifferChoice::Deep => ContentSniffer::Deep,
        }
    }
}

/// Parses `--timeout`, rejecting non-positive values.
fn parse_timeout(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if seconds > 0.0 {
        Ok(seconds)
    } else {
        Err("timeout must be greater than 0".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["facegrab", "manifest.txt", "actors/"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.inputfile, PathBuf::from("manifest.txt"));
        assert_eq!(args.datasetpath, PathBuf::from("actors/"));
        assert!(!args.crop_face);
        assert!((args.timeout - 60.0).abs() < f64::EPSILON);
        assert_eq!(args.max_retries, 1);
        assert_eq!(args.logfile, PathBuf::from("download.log"));
        assert_eq!(args.start_at_line, 2);
        assert_eq!(args.end_at_line, 0);
        assert_eq!(args.sniffer, SnifferChoice::Deep);
    }

    #[test]
    fn test_cli_requires_both_positionals() {
        let result = Args::try_parse_from(["facegrab", "manifest.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_underscore_flag_spellings() {
        let args = parse(&[
            "--crop_face",
            "--max_retries",
            "3",
            "--start_at_line",
            "10",
            "--end_at_line",
            "20",
        ])
        .unwrap();
        assert!(args.crop_face);
        assert_eq!(args.max_retries, 3);
        assert_eq!(args.start_at_line, 10);
        assert_eq!(args.end_at_line, 20);
    }

    #[test]
    fn test_cli_timeout_must_be_positive() {
        assert!(parse(&["--timeout", "0"]).is_err());
        assert!(parse(&["--timeout", "-1.5"]).is_err());
        assert!(parse(&["--timeout", "0.5"]).is_ok());
    }

    #[test]
    fn test_cli_max_retries_minimum_is_one() {
        let result = parse(&["--max_retries", "0"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_start_at_line_rejects_zero() {
        assert!(parse(&["--start_at_line", "0"]).is_err());
        assert!(parse(&["--start_at_line", "1"]).is_ok());
    }

    #[test]
    fn test_cli_sniffer_choices() {
        let args = parse(&["--sniffer", "signature"]).unwrap();
        assert_eq!(ContentSniffer::from(args.sniffer), ContentSniffer::Signature);
    }

    #[test]
    fn test_cli_verbose_and_quiet_flags() {
        let args = parse(&["-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        let args = parse(&["-q"]).unwrap();
        assert!(args.quiet);
    }
}
