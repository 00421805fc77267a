//! # git-fleet CLI
//!
//! This is the binary entry point for the `git-fleet` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating the outcome into an exit status: `0` on success, `1` when a
//!   command ran but some repository failed, `2` for usage and configuration
//!   errors.
//!
//! The core logic lives in the `git_fleet` library; the binary only renders it.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
