//! Command line preprocessing.
//!
//! Shells and flag parsers both have opinions about `*` and `?`. Before the
//! argument vector reaches a [`ParserBackend`](crate::cli::ParserBackend) it is
//! reordered so that every positional argument comes first and every
//! `--flag value...` group follows, in one of two layouts:
//!
//! - [`Layout::Flattened`]: each value gets its own flag occurrence
//!   (`--exclude a --exclude b`) and option tokens have their wildcards
//!   escaped.
//! - [`Layout::Grouped`]: each flag appears once followed by all of its values
//!   (`--exclude a b`), untouched.

mod escape;
mod normalize;

pub use escape::{ESCAPES, escape, escape_all, unescape, unescape_all};
pub use normalize::{Layout, flatten, group, normalize};

/// Token that switches the scanner back to positional arguments.
pub const SEPARATOR: &str = "--";
