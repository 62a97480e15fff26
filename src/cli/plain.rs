use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use super::{Invocation, ParserBackend, non_empty};
use crate::argv::Layout;
use crate::zip::{Compression, UnzipRequest, ZipRequest};

/// Mode used when the first argument names no subcommand.
const DEFAULT_SUBCOMMAND: &str = "zip";

/// Tokens clap handles itself in the subcommand position.
const SUBCOMMAND_TOKENS: &[&str] = &["zip", "unzip", "help", "-h", "--help", "-V", "--version"];

/// `clap` builder front end fed grouped argv: every flag appears once with
/// all of its values. A missing mode means `zip`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainParser;

impl PlainParser {
    pub fn command() -> Command {
        Command::new("zipper")
            .version(env!("CARGO_PKG_VERSION"))
            .about("(Un)zip files/folders with optional AES encryption")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Command::new("zip")
                    .about("Zip files and folders")
                    .arg(inputs("File(s) to zip"))
                    .arg(
                        Arg::new("exclude")
                            .long("exclude")
                            .help("Exclude patterns")
                            .num_args(0..)
                            .action(ArgAction::Append),
                    )
                    .arg(output("Archive to write"))
                    .arg(
                        Arg::new("password")
                            .long("password")
                            .help("Prompt for password")
                            .action(ArgAction::SetTrue),
                    )
                    .arg(base("Base input path for files to zip"))
                    .arg(
                        Arg::new("compression")
                            .long("compression")
                            .help("Compression algorithm")
                            .value_parser(value_parser!(Compression))
                            .default_value("deflate"),
                    ),
            )
            .subcommand(
                Command::new("unzip")
                    .about("Unzip file(s)")
                    .arg(inputs("Zip file(s) to extract"))
                    .arg(output("Folder to extract to"))
                    .arg(base("Base input path for files to unzip")),
            )
    }
}

fn inputs(help: &'static str) -> Arg {
    Arg::new("inputs")
        .help(help)
        .num_args(0..)
        .action(ArgAction::Append)
        .default_value("*")
}

fn output(help: &'static str) -> Arg {
    Arg::new("output").long("output").short('o').help(help)
}

fn base(help: &'static str) -> Arg {
    Arg::new("base").long("base").help(help).default_value(".")
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

impl ParserBackend for PlainParser {
    fn layout(&self) -> Layout {
        Layout::Grouped
    }

    fn parse_normalized(&self, mut args: Vec<String>) -> Result<Invocation, clap::Error> {
        if args.get(1).is_some_and(|arg| !SUBCOMMAND_TOKENS.contains(&arg.as_str())) {
            args.insert(1, DEFAULT_SUBCOMMAND.to_string());
        }
        let matches = Self::command().try_get_matches_from(args)?;

        match matches.subcommand() {
            Some(("unzip", sub)) => Ok(Invocation::Unzip(UnzipRequest {
                inputs: strings(sub, "inputs"),
                output: non_empty(string(sub, "output")).map(PathBuf::from),
                base: string(sub, "base").unwrap_or_default(),
            })),
            Some(("zip", sub)) => Ok(Invocation::Zip(ZipRequest {
                inputs: strings(sub, "inputs"),
                excludes: strings(sub, "exclude"),
                output: non_empty(string(sub, "output")).map(PathBuf::from),
                base: string(sub, "base").unwrap_or_default(),
                password: sub.get_flag("password"),
                compression: sub
                    .get_one::<Compression>("compression")
                    .copied()
                    .unwrap_or_default(),
            })),
            _ => Err(Self::command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required",
            )),
        }
    }
}
