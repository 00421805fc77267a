//! # Conflicts Command Implementation
//!
//! This module implements the `conflicts` subcommand. For every repository
//! that has a base branch it simulates merging the base into `HEAD`, replays
//! each local commit onto the base, and lists the paths both sides touched.
//!
//! Nothing is written to the repositories; every simulation runs through
//! `git merge-tree`.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use console::Style;
use rayon::prelude::*;
use serde::Serialize;

use git_fleet::conflict::{self, PathOverlap};
use git_fleet::correlation::CommitRange;
use git_fleet::error::Result as FleetResult;
use git_fleet::model::{CommitConflict, ConflictPrediction};
use git_fleet::output::OutputConfig;
use git_fleet::repository::RepositoryManager;

use super::{base_ref, exit_code, stderr_is_term, with_interrupt, Workspace};
use crate::cli::GlobalArgs;

/// Predict merge and rebase conflicts against the base branch
#[derive(Args, Debug)]
pub struct ConflictsArgs {
    /// Print the predictions as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Predictions for one repository against its base.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepoConflicts {
    name: String,
    base: Option<String>,
    /// `None` when the merge simulation was indeterminate.
    merge: Option<ConflictPrediction>,
    rebase: Vec<CommitConflict>,
    overlapping: Vec<PathOverlap>,
    error: Option<String>,
}

impl RepoConflicts {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            merge: None,
            rebase: Vec::new(),
            overlapping: Vec::new(),
            error: None,
        }
    }
}

fn predict(repo: &Path, base: &str, out: &mut RepoConflicts) -> FleetResult<()> {
    out.merge = conflict::predict_merge_conflict(repo, "HEAD", base)?;
    out.rebase = conflict::predict_rebase_conflicts(repo, base, &CommitRange::new(base, "HEAD"))?;
    out.overlapping = conflict::overlapping_paths(repo, "HEAD", base)?;
    Ok(())
}

fn render(report: &RepoConflicts, config: &OutputConfig) -> String {
    let name = config.paint(&report.name, &Style::new().bold());
    if let Some(error) = &report.error {
        return format!("{}  {}", name, config.paint(error, &Style::new().red()));
    }
    let Some(base) = &report.base else {
        return format!("{}  no base remote", name);
    };

    let mut lines = Vec::new();
    let merge = match &report.merge {
        Some(p) if p.has_conflict => config.paint("conflict", &Style::new().red()),
        Some(_) => config.paint("clean", &Style::new().green()),
        None => config.paint("unknown", &Style::new().yellow()),
    };
    lines.push(format!("{}  merge {} {}", name, base, merge));
    if let Some(p) = &report.merge {
        for file in &p.conflicting_files {
            lines.push(format!("    {}", file));
        }
    }
    for c in &report.rebase {
        lines.push(format!(
            "  rebase {} {}: {}",
            c.commit.short_hash,
            c.commit.subject,
            c.files.join(", ")
        ));
    }
    if !report.overlapping.is_empty() {
        let paths: Vec<&str> = report.overlapping.iter().map(|o| o.path.as_str()).collect();
        lines.push(format!("  touched on both sides: {}", paths.join(", ")));
    }
    lines.join("\n")
}

/// Execute the `conflicts` command.
pub fn execute(args: ConflictsArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let workspace = Workspace::load(global)?;
    let request = workspace.config.request();
    let manager = RepositoryManager::new();
    let feedback = !args.json && stderr_is_term();

    let reports = with_interrupt(feedback, |token| {
        let reports: Vec<RepoConflicts> = workspace
            .targets
            .par_iter()
            .map(|target| {
                let mut out = RepoConflicts::new(&target.name);
                let status = match manager.repo_status(&target.path, &target.name, &request, token) {
                    Ok(status) => status,
                    Err(e) => {
                        out.error = Some(e.to_string());
                        return out;
                    }
                };
                out.base = status.base.as_ref().map(base_ref);
                if let Some(base) = out.base.clone() {
                    if let Err(e) = predict(&target.path, &base, &mut out) {
                        out.error = Some(e.to_string());
                    }
                }
                out
            })
            .collect();
        token.check()?;
        Ok(reports)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let config = OutputConfig::from_env_and_flag(&global.color);
        for report in &reports {
            println!("{}", render(report, &config));
        }
    }

    Ok(exit_code(reports.iter().any(|r| r.error.is_some())))
}
