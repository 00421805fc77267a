//! # Status Command Implementation
//!
//! This module implements the `status` subcommand, which reports every
//! member repository of the workspace against the expected branch, its base
//! and its share remote.
//!
//! ## Functionality
//!
//! - **Filtering**: `--where` narrows the output with the flag language
//!   (`dirty+unpushed,^detached`). The expression is validated before any
//!   repository is touched.
//! - **Fetching**: `--fetch` updates remote-tracking refs first.
//! - **JSON**: `--json` prints the workspace summary for tooling; see
//!   `git-fleet schema` for its shape.
//!
//! Repositories whose status could not be gathered are always shown. The exit
//! status is 1 when any repository failed to fetch or report.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use git_fleet::filter::FilterExpr;
use git_fleet::flags::compute_flags;
use git_fleet::model::{RepoReport, WorkspaceSummary};
use git_fleet::orchestrator::{self, apply_fetch_failures, summarize};
use git_fleet::output::{render_summary, OutputConfig};
use git_fleet::repository::RepositoryManager;
use git_fleet::suggestions;

use super::{exit_code, fetch::fetch_with_progress, stderr_is_term, with_interrupt, Workspace};
use crate::cli::GlobalArgs;

/// Show the status of every repository in the workspace
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show repositories matching a flag expression.
    ///
    /// ',' is OR, '+' is AND, a leading '^' negates a flag.
    /// Example: --where 'dirty+unpushed,^detached'
    #[arg(long = "where", value_name = "EXPR")]
    pub filter: Option<String>,

    /// Print the workspace summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Fetch share and base remotes before gathering status.
    #[arg(long)]
    pub fetch: bool,
}

/// Reports matching `filter`. Failed reports always match.
fn visible_reports<'a>(
    summary: &'a WorkspaceSummary,
    filter: Option<&FilterExpr>,
) -> Vec<&'a RepoReport> {
    summary
        .repos
        .iter()
        .filter(|report| match (filter, &report.status) {
            (Some(expr), Some(status)) => expr.matches(&compute_flags(status, &summary.branch)),
            _ => true,
        })
        .collect()
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let filter = args
        .filter
        .as_deref()
        .map(FilterExpr::parse)
        .transpose()
        .map_err(|e| suggestions::for_error(&e))?;

    let workspace = Workspace::load(global)?;
    let request = workspace.config.request();
    let manager = RepositoryManager::new();
    let feedback = !args.json && stderr_is_term();

    let summary = with_interrupt(feedback, |token| {
        let fetched = if args.fetch {
            Some(fetch_with_progress(&manager, &workspace.targets, token, feedback)?)
        } else {
            None
        };
        let mut summary = orchestrator::gather_workspace_summary(
            &manager,
            &workspace.name,
            &workspace.targets,
            &request,
            token,
        )?;
        if let Some(outcomes) = fetched {
            apply_fetch_failures(&mut summary, outcomes);
        }
        Ok(summary)
    })?;

    let visible = visible_reports(&summary, filter.as_ref());
    if args.json {
        let shown = summarize(
            &summary.workspace,
            &request,
            visible.iter().map(|r| (*r).clone()).collect(),
        );
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        let config = OutputConfig::from_env_and_flag(&global.color);
        println!("{}", render_summary(&summary, &visible, &config));
    }

    Ok(exit_code(summary.has_failures()))
}
