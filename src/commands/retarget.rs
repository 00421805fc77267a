//! # Retarget Command Implementation
//!
//! This module implements the `retarget` subcommand, which plans moving the
//! feature branch from its current base onto another branch of the base
//! remote. For every repository it reports how many local commits would be
//! replayed, how many are already on the new base, and whether merging the
//! new base would conflict.
//!
//! The command only plans; it never rebases.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use console::Style;
use rayon::prelude::*;
use serde::Serialize;

use git_fleet::conflict;
use git_fleet::correlation::{analyze_retarget_replay, CommitRange};
use git_fleet::error::Result as FleetResult;
use git_fleet::git;
use git_fleet::model::{ConflictVerdict, RetargetReplay};
use git_fleet::output::OutputConfig;
use git_fleet::repository::RepositoryManager;

use super::{base_ref, exit_code, stderr_is_term, with_interrupt, Workspace};
use crate::cli::GlobalArgs;

/// Plan moving the feature branch onto a new base branch
#[derive(Args, Debug)]
pub struct RetargetArgs {
    /// Branch on the base remote to move onto.
    #[arg(value_name = "NEW_BASE")]
    pub new_base: String,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetargetPlan {
    name: String,
    from: Option<String>,
    onto: Option<String>,
    replay: Option<RetargetReplay>,
    conflict: ConflictVerdict,
    error: Option<String>,
}

fn plan(repo: &Path, from: &str, onto: &str) -> FleetResult<(RetargetReplay, ConflictVerdict)> {
    let replay = analyze_retarget_replay(repo, from, onto, &CommitRange::new(from, "HEAD"))?;
    let prediction = conflict::predict_merge_conflict(repo, "HEAD", onto)?;
    Ok((replay, conflict::verdict(prediction.as_ref())))
}

fn render(plan: &RetargetPlan, config: &OutputConfig) -> String {
    let name = config.paint(&plan.name, &Style::new().bold());
    if let Some(error) = &plan.error {
        return format!("{}  {}", name, config.paint(error, &Style::new().red()));
    }
    let (Some(from), Some(onto), Some(replay)) = (&plan.from, &plan.onto, &plan.replay) else {
        return format!("{}  no base remote", name);
    };
    let conflict = match plan.conflict {
        ConflictVerdict::Conflict => config.paint("conflict", &Style::new().red()),
        ConflictVerdict::Clean => config.paint("clean", &Style::new().green()),
        ConflictVerdict::Unknown => config.paint("unknown", &Style::new().yellow()),
        ConflictVerdict::NotChecked => String::new(),
    };
    format!(
        "{}  {} -> {}  replay {} of {} ({} already on {})  {}",
        name,
        from,
        onto,
        replay.to_replay,
        replay.total_local,
        replay.already_on_target,
        onto,
        conflict
    )
    .trim_end()
    .to_string()
}

/// Execute the `retarget` command.
pub fn execute(args: RetargetArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let workspace = Workspace::load(global)?;
    let request = workspace.config.request();
    let manager = RepositoryManager::new();
    let feedback = !args.json && stderr_is_term();

    let plans = with_interrupt(feedback, |token| {
        let plans: Vec<RetargetPlan> = workspace
            .targets
            .par_iter()
            .map(|target| {
                let mut out = RetargetPlan {
                    name: target.name.clone(),
                    from: None,
                    onto: None,
                    replay: None,
                    conflict: ConflictVerdict::NotChecked,
                    error: None,
                };
                let base = match manager.repo_status(&target.path, &target.name, &request, token) {
                    Ok(status) => status.base,
                    Err(e) => {
                        out.error = Some(e.to_string());
                        return out;
                    }
                };
                let Some(base) = base else {
                    return out;
                };
                let from = base_ref(&base);
                let onto = format!("{}/{}", base.remote, args.new_base);
                match git::resolve_ref(&target.path, &onto) {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        out.error = Some(format!("{} does not exist", onto));
                        return out;
                    }
                    Err(e) => {
                        out.error = Some(e.to_string());
                        return out;
                    }
                }
                match plan(&target.path, &from, &onto) {
                    Ok((replay, verdict)) => {
                        out.replay = Some(replay);
                        out.conflict = verdict;
                    }
                    Err(e) => out.error = Some(e.to_string()),
                }
                out.from = Some(from);
                out.onto = Some(onto);
                out
            })
            .collect();
        token.check()?;
        Ok(plans)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        let config = OutputConfig::from_env_and_flag(&global.color);
        for plan in &plans {
            println!("{}", render(plan, &config));
        }
    }

    Ok(exit_code(plans.iter().any(|p| p.error.is_some())))
}
