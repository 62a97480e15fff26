//! Command line front ends.
//!
//! Two [`ParserBackend`]s turn argv into the same [`Invocation`]:
//!
//! - [`RichParser`] is declarative (`clap` derive) and expects a flag
//!   repeated once per value, so argv is [flattened](crate::argv::flatten).
//! - [`PlainParser`] is assembled with the `clap` builder API and takes every
//!   value of a flag in one occurrence, so argv is
//!   [grouped](crate::argv::group).
//!
//! Which one runs is decided once, from [`Config`](crate::Config).

mod plain;
mod rich;

pub use plain::PlainParser;
pub use rich::{Cli, Command, RichParser, UnzipArgs, ZipArgs};

use log::debug;

use crate::argv::{Layout, normalize};
use crate::config::BackendKind;
use crate::zip::{UnzipRequest, ZipRequest};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Zip(ZipRequest),
    Unzip(UnzipRequest),
}

/// Turns a full argv, program name first, into an [`Invocation`].
pub trait ParserBackend {
    /// Argument layout the parser expects.
    fn layout(&self) -> Layout;

    /// Parse argv that has already been normalized with [`layout`](Self::layout).
    fn parse_normalized(&self, args: Vec<String>) -> Result<Invocation, clap::Error>;

    /// Normalize `args` and parse the result.
    fn parse(&self, args: &[String]) -> Result<Invocation, clap::Error> {
        debug!("Raw argv: {:?}", args);
        self.parse_normalized(normalize(args, self.layout()))
    }
}

/// Backend for the configured kind.
pub fn backend(kind: BackendKind) -> Box<dyn ParserBackend> {
    match kind {
        BackendKind::Rich => Box::new(RichParser),
        BackendKind::Plain => Box::new(PlainParser),
    }
}

/// Empty `--output` values mean "not given".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
