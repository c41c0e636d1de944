//! ## simtemp-cli
//! **Command-line host for the simulated sensor**
//!
//! Loads the layered configuration, installs logging, starts a device and
//! runs one subcommand against it.

use std::process::ExitCode;

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match commands::run_command(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("simtemp: {err:#}");
            ExitCode::FAILURE
        }
    }
}
