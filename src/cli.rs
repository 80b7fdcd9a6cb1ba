use clap::Parser;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::input::InputSource;

/// Verbosity levels for diagnostic logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show warnings, such as replaced malformed input
    #[default]
    Normal,
    /// Show record boundaries and run details
    Verbose,
}

impl VerbosityLevel {
    /// Log level used when `RUST_LOG` does not say otherwise
    pub fn level_filter(self) -> LevelFilter {
        match self {
            VerbosityLevel::Quiet => LevelFilter::Error,
            VerbosityLevel::Normal => LevelFilter::Warn,
            VerbosityLevel::Verbose => LevelFilter::Debug,
        }
    }
}

/// Validate a stream of MARCXML records, reporting problems record by record
#[derive(Parser, Debug, Clone)]
#[command(name = "marc-validate")]
#[command(
    about = "Validate MARCXML records against the MARC 21 slim schema and report each invalid record"
)]
#[command(version)]
pub struct Cli {
    /// Input file; `-` or absent reads standard input
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Expect gzipped input
    #[arg(short = 'z', long = "gunzip")]
    pub gunzip: bool,

    /// Replace malformed UTF-8 sequences with U+FFFD
    #[arg(short = 'r', long = "replace-malformed")]
    pub replace_malformed: bool,

    /// Schema to validate against instead of the bundled MARC 21 slim schema
    #[arg(short = 's', long = "schema", value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn input_source(&self) -> InputSource {
        InputSource::from_arg(self.input.as_deref())
    }
}
