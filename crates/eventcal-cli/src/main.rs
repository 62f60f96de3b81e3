//! eventcal CLI entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use eventcal_cli::cli::{Cli, Mode};
use eventcal_cli::config::CliConfig;
use eventcal_cli::error::CliResult;
use eventcal_cli::render::OutputFormat;
use eventcal_cli::session::Session;
use eventcal_core::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };

    // Initialize tracing
    let tracing = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else if cli.mode == Mode::Headless {
        TracingConfig::headless()
    } else {
        TracingConfig::default()
    };
    init_tracing(tracing)?;

    let command_file = cli.command_file()?.cloned();
    let format = OutputFormat::from_json_flag(cli.json || config.display.json);
    let mut session = Session::new(config, format)?;

    match command_file {
        Some(path) => session.run_headless(&path, io::stdout().lock()),
        None => session.run_interactive(io::stdin().lock(), io::stdout(), io::stderr()),
    }
}
