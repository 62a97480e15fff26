//! Main entry point for the zipper CLI application.
//!
//! Builds the configuration once, normalizes argv for the configured parser
//! backend and dispatches to the archive builder or extractor.

use std::process::ExitCode;

use log::{error, warn};

use zipper::{Config, Report, TerminalPrompt, backend};

/// Every input was processed.
const SUCCESS: u8 = 0;
/// Finished, but some inputs were skipped.
const WARNING: u8 = 1;
/// A fault stopped the run.
const FATAL_ERROR: u8 = 2;
/// The command line was rejected.
const BAD_ARGS: u8 = 255;

fn main() -> ExitCode {
    let config = Config::from_env();

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let invocation = match backend(config.parser).parse(&args) {
        Ok(invocation) => invocation,
        Err(err) => {
            // --help and --version also arrive here
            let _ = err.print();
            return ExitCode::from(if err.use_stderr() { BAD_ARGS } else { SUCCESS });
        }
    };

    match zipper::run(&invocation, &mut TerminalPrompt) {
        Ok(report) => ExitCode::from(status(&report)),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(FATAL_ERROR)
        }
    }
}

fn status(report: &Report) -> u8 {
    if !report.has_skips() {
        return SUCCESS;
    }
    for (path, reason) in report.skipped() {
        warn!("Skipped {}: {}", path.display(), reason);
    }
    WARNING
}
