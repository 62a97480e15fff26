//! Error types.
//!
//! Faults with no recovery travel as [`anyhow::Error`]. What is defined here
//! is the part callers branch on: command line input rejected before any
//! I/O, and the per-item reasons an input was skipped.

use thiserror::Error;

/// Input rejected before anything touches the filesystem.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Why a single input produced no archive or extraction.
///
/// None of these stop the run; the remaining inputs are still processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("not found")]
    NotFound,
    #[error("no files matched")]
    NoMatch,
    #[error("not a valid zip file")]
    InvalidFormat,
    #[error("archive already exists")]
    Collision,
    #[error("wrong password")]
    AuthFailure,
}
