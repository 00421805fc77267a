//! # Conflict Prediction
//!
//! Predicts merge and rebase conflicts with `git merge-tree --write-tree`,
//! which performs a full three-way merge in the object database only. The
//! working tree, the index and all refs are left untouched.
//!
//! An indeterminate simulation (old git, unexpected exit status, conflict
//! exit without a file list) yields `None`. Callers must treat that as
//! unknown, never as clean.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::correlation::CommitRange;
use crate::error::Result;
use crate::git::{self, GitOutput};
use crate::model::{CommitConflict, ConflictPrediction, ConflictVerdict};

/// Interpret a `merge-tree` result. `None` when the outcome is indeterminate.
fn interpret_merge_tree(out: &GitOutput) -> Option<ConflictPrediction> {
    match out.code {
        Some(0) => Some(ConflictPrediction {
            has_conflict: false,
            conflicting_files: Vec::new(),
        }),
        Some(1) => {
            let files = parse_conflicted_files(&out.stdout);
            if files.is_empty() {
                None
            } else {
                Some(ConflictPrediction {
                    has_conflict: true,
                    conflicting_files: files,
                })
            }
        }
        _ => None,
    }
}

/// File names from `merge-tree --name-only` output: the first line is the
/// resulting tree id, conflicted paths follow until the first blank line.
fn parse_conflicted_files(stdout: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    stdout
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(String::from)
        .collect()
}

/// Predict whether merging `theirs` into `ours` would conflict.
pub fn predict_merge_conflict(
    repo: &Path,
    ours: &str,
    theirs: &str,
) -> Result<Option<ConflictPrediction>> {
    let out = git::merge_tree(repo, ours, theirs, None)?;
    let prediction = interpret_merge_tree(&out);
    if prediction.is_none() {
        debug!(
            "merge simulation of {} into {} was indeterminate (exit {:?}): {}",
            theirs,
            ours,
            out.code,
            out.stderr.trim()
        );
    }
    Ok(prediction)
}

/// Collapse an optional prediction into a verdict for the status model.
pub fn verdict(prediction: Option<&ConflictPrediction>) -> ConflictVerdict {
    match prediction {
        Some(p) if p.has_conflict => ConflictVerdict::Conflict,
        Some(_) => ConflictVerdict::Clean,
        None => ConflictVerdict::Unknown,
    }
}

/// Predict which commits of `incoming` would conflict when replayed onto `onto`.
///
/// Each commit is simulated on its own, in chronological order, with its
/// parent as the merge base. Root commits are skipped, and so are commits
/// whose simulation is indeterminate.
pub fn predict_rebase_conflicts(
    repo: &Path,
    onto: &str,
    incoming: &CommitRange,
) -> Result<Vec<CommitConflict>> {
    let mut commits = git::list_commits(repo, &incoming.rev_range())?;
    commits.reverse();

    let mut conflicts = Vec::new();
    for commit in commits {
        let Some(parent) = git::resolve_ref(repo, &format!("{}^", commit.hash))? else {
            debug!("skipping root commit {}", commit.short_hash);
            continue;
        };
        let out = git::merge_tree(repo, onto, &commit.hash, Some(&parent))?;
        match interpret_merge_tree(&out) {
            Some(p) if p.has_conflict => conflicts.push(CommitConflict {
                commit,
                files: p.conflicting_files,
            }),
            Some(_) => {}
            None => debug!("replay of {} was indeterminate", commit.short_hash),
        }
    }
    Ok(conflicts)
}

/// A path changed on both sides since their merge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOverlap {
    pub path: String,
    /// Lines added plus deleted on our side; `None` for binary files.
    pub ours_lines: Option<u32>,
    pub theirs_lines: Option<u32>,
}

/// Paths both `ours` and `theirs` changed since their merge base.
///
/// Overlap does not imply a conflict; it shows where one is possible.
pub fn overlapping_paths(repo: &Path, ours: &str, theirs: &str) -> Result<Vec<PathOverlap>> {
    let Some(base) = git::merge_base(repo, ours, theirs)? else {
        return Ok(Vec::new());
    };

    let ours_paths: BTreeSet<String> = git::diff_name_status(repo, &base, ours)?
        .into_iter()
        .map(|e| e.path)
        .collect();
    let theirs_paths: BTreeSet<String> = git::diff_name_status(repo, &base, theirs)?
        .into_iter()
        .map(|e| e.path)
        .collect();

    let shared: Vec<&String> = ours_paths.intersection(&theirs_paths).collect();
    if shared.is_empty() {
        return Ok(Vec::new());
    }

    let line_counts = |to: &str| -> Result<BTreeMap<String, Option<u32>>> {
        Ok(git::diff_numstat(repo, &base, to)?
            .into_iter()
            .map(|s| {
                let lines = s.additions.zip(s.deletions).map(|(a, d)| a + d);
                (s.path, lines)
            })
            .collect())
    };
    let ours_lines = line_counts(ours)?;
    let theirs_lines = line_counts(theirs)?;

    Ok(shared
        .into_iter()
        .map(|path| PathOverlap {
            path: path.clone(),
            ours_lines: ours_lines.get(path).copied().flatten(),
            theirs_lines: theirs_lines.get(path).copied().flatten(),
        })
        .collect())
}
