//! Process-wide settings, fixed at startup.

use std::env;
use std::str::FromStr;

use log::LevelFilter;

/// Environment variable selecting the parser backend (`rich` or `plain`).
pub const PARSER_ENV: &str = "ZIPPER_PARSER";
/// Environment variable selecting the log level (`error` .. `trace`).
pub const LOG_ENV: &str = "ZIPPER_LOG";

/// Which command line front end turns argv into an
/// [`Invocation`](crate::cli::Invocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Declarative `clap` derive parser with repeated flags.
    #[default]
    Rich,
    /// `clap` builder parser taking every value of a flag at once.
    Plain,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rich" | "derive" => Ok(BackendKind::Rich),
            "plain" | "builder" => Ok(BackendKind::Plain),
            other => Err(format!("unknown parser backend: {other}")),
        }
    }
}

/// Immutable configuration handed to [`run`](crate::run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub parser: BackendKind,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parser: BackendKind::default(),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Build the configuration from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            parser: lookup(PARSER_ENV)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.parser),
            log_level: lookup(LOG_ENV)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_level),
        }
    }
}
