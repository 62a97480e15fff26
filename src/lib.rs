//! # zipper
//!
//! (Un)zip files and folders with glob selection and optional AES
//! encryption.
//!
//! Inputs are glob patterns resolved against a base directory. Directories
//! are walked recursively, with exclude patterns pruning whole subtrees
//! before they are read. Without an explicit output every top-level match is
//! written to its own archive beside it; with one, everything goes into a
//! single archive. Existing archives are never overwritten.
//!
//! Extraction tries each archive without a password first and asks for one
//! (up to three times) only when the archive is encrypted.
//!
//! ## Features
//!
//! - Store, Deflate, BZip2 and LZMA compression
//! - WinZip AES-256 encryption
//! - Recursive `**` patterns for inputs and excludes
//! - Two command line front ends sharing one request model
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use zipper::{Compression, TerminalPrompt, ZipRequest, build};
//!
//! fn main() -> anyhow::Result<()> {
//!     let request = ZipRequest {
//!         inputs: vec!["src".to_string()],
//!         excludes: vec!["**/target".to_string()],
//!         output: Some(PathBuf::from("src.zip")),
//!         compression: Compression::Store,
//!         ..ZipRequest::default()
//!     };
//!
//!     let report = build(&request, &mut TerminalPrompt)?;
//!     for archive in report.created() {
//!         println!("{}", archive.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod argv;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::{Invocation, ParserBackend, backend};
pub use config::{BackendKind, Config};
pub use error::{Error, SkipReason};
pub use io::{PasswordPrompt, TerminalPrompt};
pub use crate::zip::{Compression, Outcome, Report, UnzipRequest, ZipRequest, build, extract};

/// Carry out `invocation`, asking `prompt` for any password needed.
pub fn run<P>(invocation: &Invocation, prompt: &mut P) -> anyhow::Result<Report>
where
    P: PasswordPrompt + ?Sized,
{
    match invocation {
        Invocation::Zip(request) => build(request, prompt),
        Invocation::Unzip(request) => extract(request, prompt),
    }
}
