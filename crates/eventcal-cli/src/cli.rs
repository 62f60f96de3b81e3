//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::{CliError, CliResult};

/// eventcal - calendar events from the command line
#[derive(Debug, Parser)]
#[command(name = "eventcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "EVENTCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// How commands are read
    #[arg(long, value_enum, default_value_t = Mode::Interactive)]
    pub mode: Mode,

    /// Command file to run in headless mode
    pub file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Where commands come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Prompt for commands on stdin
    Interactive,
    /// Run the commands of a file, stopping at the first failure
    Headless,
}

impl Cli {
    /// Returns the command file for headless runs, checking that the mode
    /// and file arguments agree.
    pub fn command_file(&self) -> CliResult<Option<&PathBuf>> {
        match (self.mode, &self.file) {
            (Mode::Headless, Some(file)) => Ok(Some(file)),
            (Mode::Headless, None) => Err(CliError::usage(
                "headless mode needs a command file: eventcal --mode headless <file>",
            )),
            (Mode::Interactive, Some(_)) => Err(CliError::usage(
                "a command file is only accepted with --mode headless",
            )),
            (Mode::Interactive, None) => Ok(None),
        }
    }
}
