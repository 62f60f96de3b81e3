//! Command language, console output, export and config
//!
//! This crate provides the `eventcal` command-line interface.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod parser;
pub mod render;
pub mod session;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use session::Session;
