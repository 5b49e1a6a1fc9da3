//! dupelint - Duplicate File Finder
//!
//! Entry point for the dupelint CLI.

use clap::Parser;
use dupelint::{cli::Cli, error::ExitCode};

fn main() {
    let cli = Cli::parse();

    match dupelint::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    }
}
