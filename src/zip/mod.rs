//! Archive creation and extraction.
//!
//! ## Architecture
//!
//! - [`builder`]: turns include/exclude patterns into a set of files and
//!   writes one archive per match, or a single archive for an explicit
//!   output path.
//! - [`extractor`]: finds archives by pattern and extracts them, asking for
//!   a password when the archive turns out to be encrypted.
//!
//! Byte-level work is done by the [`zip`](::zip) crate. Encrypted archives
//! use WinZip AES-256. The crate cannot write LZMA, so `lzma` compresses
//! and frames those entries itself before handing them over.
//!
//! Both operations report per-input results as [`Outcome`]s; only faults
//! with no sensible recovery are returned as errors.

mod builder;
mod extractor;
mod lzma;

pub use builder::{ArchiveSettings, ZipRequest, build, write_archive};
pub use extractor::{PASSWORD_ATTEMPTS, UnzipRequest, extract};

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::SkipReason;

/// Compression applied to every entry of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Compression {
    #[default]
    Deflate,
    Store,
    Bzip2,
    Lzma,
}

impl Compression {
    pub fn method(self) -> ::zip::CompressionMethod {
        match self {
            Compression::Deflate => ::zip::CompressionMethod::Deflated,
            Compression::Store => ::zip::CompressionMethod::Stored,
            Compression::Bzip2 => ::zip::CompressionMethod::Bzip2,
            Compression::Lzma => ::zip::CompressionMethod::Lzma,
        }
    }
}

/// Result for one input of a build or extract run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created {
        archive: PathBuf,
        entries: usize,
        encrypted: bool,
    },
    Extracted {
        archive: PathBuf,
        target: PathBuf,
    },
    Skipped {
        path: PathBuf,
        reason: SkipReason,
    },
}

/// Everything one run produced, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn skip(&mut self, path: impl Into<PathBuf>, reason: SkipReason) {
        self.push(Outcome::Skipped {
            path: path.into(),
            reason,
        });
    }

    /// Archives written during the run.
    pub fn created(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Created { archive, .. } => Some(archive.as_path()),
            _ => None,
        })
    }

    /// Directories archives were extracted into.
    pub fn extracted(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Extracted { target, .. } => Some(target.as_path()),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&Path, SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Skipped { path, reason } => Some((path.as_path(), *reason)),
            _ => None,
        })
    }

    pub fn has_skips(&self) -> bool {
        self.skipped().next().is_some()
    }
}
