//! # Fetch Command Implementation
//!
//! This module implements the `fetch` subcommand, which fetches the share and
//! base remotes of every workspace repository concurrently, showing progress
//! on stderr when it is a terminal.
//!
//! A failed fetch is reported for its repository and does not stop the
//! others. The exit status is 1 when any fetch failed.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use console::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use git_fleet::error::Result as FleetResult;
use git_fleet::interrupt::CancelToken;
use git_fleet::orchestrator::{fetch_all, FetchOutcome, RepoTarget};
use git_fleet::output::OutputConfig;
use git_fleet::repository::RepositoryManager;

use super::{exit_code, stderr_is_term, with_interrupt, Workspace};
use crate::cli::GlobalArgs;

/// Fetch the share and base remotes of every repository
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Do not show a progress bar.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Fetch every target, ticking a progress bar as repositories finish.
pub fn fetch_with_progress(
    manager: &RepositoryManager,
    targets: &[RepoTarget],
    token: &CancelToken,
    show_progress: bool,
) -> FleetResult<Vec<FetchOutcome>> {
    let bar = if show_progress {
        ProgressBar::with_draw_target(Some(targets.len() as u64), ProgressDrawTarget::stderr())
    } else {
        ProgressBar::hidden()
    };
    if let Ok(bar_style) = ProgressStyle::with_template("{spinner} fetching [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(bar_style.progress_chars("=> "));
    }

    let outcomes = fetch_all(manager, targets, token, |target, _| {
        bar.set_message(target.name.clone());
        bar.inc(1);
    });
    bar.finish_and_clear();
    outcomes
}

/// Execute the `fetch` command.
pub fn execute(args: FetchArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let workspace = Workspace::load(global)?;
    let manager = RepositoryManager::new();
    let feedback = !args.quiet && stderr_is_term();

    let outcomes = with_interrupt(feedback, |token| {
        fetch_with_progress(&manager, &workspace.targets, token, feedback)
    })?;

    let config = OutputConfig::from_env_and_flag(&global.color);
    let mut failed = false;
    for outcome in &outcomes {
        match &outcome.error {
            None => println!("{} {}", config.paint("ok", &Style::new().green()), outcome.name),
            Some(error) => {
                failed = true;
                let label = config.paint("failed", &Style::new().red());
                println!("{} {}: {}", label, outcome.name, error.message);
            }
        }
    }
    Ok(exit_code(failed))
}
