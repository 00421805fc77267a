//! # Completions Command Implementation
//!
//! This module implements the `completions` subcommand, which prints a shell
//! completion script for `git-fleet` generated by `clap_complete`.
//!
//! ## Example
//!
//! ```bash
//! git-fleet completions bash > ~/.local/share/bash-completion/completions/git-fleet
//! git-fleet completions zsh > ~/.zfunc/_git-fleet
//! ```

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<ExitCode> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "git-fleet", &mut io::stdout());
    Ok(ExitCode::SUCCESS)
}
