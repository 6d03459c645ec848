//! CLI entry point for the facegrab tool.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use facegrab::fetch::default_user_agent;
use facegrab::{
    BatchDriver, BatchOptions, FetcherConfig, ImageFetcher, ImagePersister, ImageValidator,
    logging,
};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Console log level: RUST_LOG env var > quiet flag > verbose flag > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let _log_guard = logging::init_logging(&args.logfile, default_level)?;

    info!(
        manifest = %args.inputfile.display(),
        dataset = %args.datasetpath.display(),
        crop_face = args.crop_face,
        start_at_line = args.start_at_line,
        end_at_line = args.end_at_line,
        "facegrab starting"
    );

    // All collaborators are constructed here once and handed to the driver;
    // nothing lives in ambient process-wide state.
    let config = FetcherConfig {
        user_agent: args.user_agent.clone().unwrap_or_else(default_user_agent),
        timeout: Duration::from_secs_f64(args.timeout),
        max_retries: args.max_retries,
    };
    let fetcher = ImageFetcher::new(&config);
    let sniffer = args.sniffer.into();
    let validator = ImageValidator::new(sniffer);
    let persister = ImagePersister::new(&args.datasetpath, sniffer);
    let driver = BatchDriver::new(fetcher, validator, persister);

    let options = BatchOptions {
        crop_face: args.crop_face,
        start_at_line: args.start_at_line,
        end_at_line: args.end_at_line,
    };

    match driver.run(&args.inputfile, &options).await {
        Ok(stats) => {
            info!(
                processed = stats.processed,
                saved = stats.saved,
                faces_saved = stats.faces_saved,
                malformed = stats.malformed,
                fetch_failures = stats.fetch_failures,
                validation_failures = stats.validation_failures,
                persist_failures = stats.persist_failures,
                "batch complete"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "aborting: manifest unusable");
            Err(err.into())
        }
    }
}
