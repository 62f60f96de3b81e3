//! CLI error types.

use std::io;
use std::path::PathBuf;

use eventcal_core::{CalendarError, Violation};
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur while running commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A calendar operation was rejected.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// A command line could not be understood.
    #[error("invalid command '{command}': {reason}")]
    Parse { command: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// JSON output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error (command file, export file, stdin).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A headless command file did not end with `exit`.
    #[error("command file {} does not end with 'exit'", path.display())]
    MissingExit { path: PathBuf },

    /// Invalid combination of command-line arguments.
    #[error("{message}")]
    Usage { message: String },

    /// Logging could not be initialised.
    #[error(transparent)]
    Tracing(#[from] eventcal_core::TracingError),
}

impl CliError {
    /// Creates a parse error for a command line.
    pub fn parse(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}

impl From<Violation> for CliError {
    fn from(violation: Violation) -> Self {
        Self::Calendar(violation.into())
    }
}
