//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::io;
use std::process::ExitCode;

use log::error;
use mapedit_cli::CliError;
use structured_logger::Builder;
use structured_logger::json::new_writer;

const LOG_LEVEL_ENV: &str = "MAPEDIT_LOG";

fn main() -> ExitCode {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_owned());
    Builder::with_level(&level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();

    match mapedit_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            error!("mapedit: {err}");
            ExitCode::FAILURE
        }
    }
}
