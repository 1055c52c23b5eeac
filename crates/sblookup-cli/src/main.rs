use clap::Parser;
use sblookup_core::logging;

mod cli;

use crate::cli::Cli;

/// Exit status for errors that stop the run before or outside the lookups
/// (bad config, unreadable input, unwritable output path). Kept clear of the
/// status bitmask.
const EXIT_FATAL: i32 = 16;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr unless a log file was requested.
    if cli.log_file {
        if let Err(err) = logging::init_logging() {
            logging::init_logging_stderr();
            tracing::warn!("file logging unavailable, using stderr: {:#}", err);
        }
    } else {
        logging::init_logging_stderr();
    }

    match cli.run().await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(err) => {
            eprintln!("sblookup error: {:#}", err);
            std::process::exit(EXIT_FATAL);
        }
    }
}
