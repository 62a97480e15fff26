use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::{Invocation, ParserBackend, non_empty};
use crate::argv::{Layout, unescape, unescape_all};
use crate::zip::{Compression, UnzipRequest, ZipRequest};

#[derive(Parser, Debug)]
#[command(name = "zipper")]
#[command(version)]
#[command(about = "(Un)zip files/folders with optional AES encryption", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipper zip src -o src.zip --exclude '**/target'   zip src/ without build output\n  \
  zipper zip '*.log' --password                   one encrypted archive per log file\n  \
  zipper unzip 'backups/*.zip' -o restored         extract every backup into restored/")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Zip files and folders
    Zip(ZipArgs),
    /// Unzip file(s)
    Unzip(UnzipArgs),
}

#[derive(Args, Debug)]
pub struct ZipArgs {
    /// File(s) or glob pattern(s) to zip
    #[arg(value_name = "INPUTS", default_value = "*")]
    pub inputs: Vec<String>,

    /// Exclude paths matching pattern (repeatable)
    #[arg(long, short = 'e', value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Write a single archive here instead of one per match
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<String>,

    /// Prompt for a password and encrypt with AES-256
    #[arg(long, overrides_with = "password")]
    pub password: bool,

    /// Base path inputs are resolved against and entries are named from
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub base: String,

    /// Compression algorithm
    #[arg(long, value_enum, default_value_t = Compression::Deflate)]
    pub compression: Compression,
}

#[derive(Args, Debug)]
pub struct UnzipArgs {
    /// Zip file(s) or glob pattern(s) to extract
    #[arg(value_name = "INPUTS", default_value = "*")]
    pub inputs: Vec<String>,

    /// Folder to extract to
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<String>,

    /// Base path inputs are resolved against
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub base: String,
}

// Option values arrive escaped; positional inputs never are.

impl From<ZipArgs> for ZipRequest {
    fn from(args: ZipArgs) -> Self {
        Self {
            inputs: args.inputs,
            excludes: unescape_all(&args.exclude),
            output: non_empty(args.output).map(|o| PathBuf::from(unescape(&o))),
            base: unescape(&args.base),
            password: args.password,
            compression: args.compression,
        }
    }
}

impl From<UnzipArgs> for UnzipRequest {
    fn from(args: UnzipArgs) -> Self {
        Self {
            inputs: args.inputs,
            output: non_empty(args.output).map(|o| PathBuf::from(unescape(&o))),
            base: unescape(&args.base),
        }
    }
}

impl From<Cli> for Invocation {
    fn from(cli: Cli) -> Self {
        match cli.command {
            Command::Zip(args) => Invocation::Zip(args.into()),
            Command::Unzip(args) => Invocation::Unzip(args.into()),
        }
    }
}

/// `clap` derive front end fed flattened, escaped argv.
#[derive(Debug, Default, Clone, Copy)]
pub struct RichParser;

impl ParserBackend for RichParser {
    fn layout(&self) -> Layout {
        Layout::Flattened
    }

    fn parse_normalized(&self, args: Vec<String>) -> Result<Invocation, clap::Error> {
        Cli::try_parse_from(args).map(Invocation::from)
    }
}
