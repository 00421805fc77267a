//! # Commit Correlation
//!
//! Matches commits across histories that were rewritten after they diverged.
//! Commits are compared by [`PatchFingerprint`], git's stable patch id: a
//! hash of the diff that ignores parents, authorship, timestamps and line
//! numbers. Two commits with different hashes but equal fingerprints carry
//! the same change.
//!
//! Fingerprints are computed on demand for each call and never stored.
//!
//! ## Limitations
//!
//! - Squash detection in [`detect_merge`] only compares against the most
//!   recent `commit_limit` commits of the base range. Older squashes are not
//!   found.
//! - [`match_diverged_commits`] reports at most one squash match, the first
//!   remote commit found to carry the whole local range.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::git;
use crate::model::{DivergenceMatch, MergeKind, RetargetReplay, SquashMatch};

/// Content-derived identifier of a net change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchFingerprint(String);

impl PatchFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Commits reachable from `to` but not from `from` (`from..to`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub from: String,
    pub to: String,
}

impl CommitRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The range in git revision syntax.
    pub fn rev_range(&self) -> String {
        format!("{}..{}", self.from, self.to)
    }
}

/// Fingerprint of a single commit's change against its first parent.
pub fn commit_fingerprint(repo: &Path, hash: &str) -> Result<Option<PatchFingerprint>> {
    let patch = git::commit_patch(repo, hash)?;
    Ok(git::patch_id(repo, &patch)?.map(PatchFingerprint))
}

/// Fingerprint of the cumulative change of a range, measured from the point
/// where the range diverged from `from`.
pub fn range_fingerprint(repo: &Path, range: &CommitRange) -> Result<Option<PatchFingerprint>> {
    let Some(base) = git::merge_base(repo, &range.from, &range.to)? else {
        return Ok(None);
    };
    let patch = git::range_patch(repo, &base, &range.to)?;
    Ok(git::patch_id(repo, &patch)?.map(PatchFingerprint))
}

/// Fingerprint each commit, keeping the order of `hashes`. Commits without a
/// diff (merges, empty commits) are left out.
fn fingerprint_commits(repo: &Path, hashes: &[String]) -> Result<Vec<(String, PatchFingerprint)>> {
    let mut out = Vec::with_capacity(hashes.len());
    for hash in hashes {
        if let Some(fp) = commit_fingerprint(repo, hash)? {
            out.push((hash.clone(), fp));
        }
    }
    Ok(out)
}

/// How `branch_tip` was integrated into `base_tip`, if at all.
///
/// An ancestor tip is a [`MergeKind::Merge`] (fast-forward or merge commit).
/// Otherwise the cumulative change of the branch since the merge base is
/// compared with each of the latest `commit_limit` commits on the base side;
/// a match is a [`MergeKind::Squash`].
pub fn detect_merge(
    repo: &Path,
    branch_tip: &str,
    base_tip: &str,
    commit_limit: usize,
) -> Result<Option<MergeKind>> {
    if git::is_ancestor(repo, branch_tip, base_tip)? {
        return Ok(Some(MergeKind::Merge));
    }

    let Some(cumulative) = range_fingerprint(repo, &CommitRange::new(base_tip, branch_tip))? else {
        return Ok(None);
    };
    let Some(merge_base) = git::merge_base(repo, branch_tip, base_tip)? else {
        return Ok(None);
    };

    let candidates = git::list_commit_hashes(
        repo,
        &format!("{}..{}", merge_base, base_tip),
        Some(commit_limit),
    )?;
    for hash in &candidates {
        if commit_fingerprint(repo, hash)?.as_ref() == Some(&cumulative) {
            debug!("{} squashed into {} as {}", branch_tip, base_tip, hash);
            return Ok(Some(MergeKind::Squash));
        }
    }
    Ok(None)
}

/// Correlate local-only and remote-only commits of a diverged branch.
///
/// Equal fingerprints are 1:1 rebase matches. When the local side has more
/// than one commit and remote commits remain unmatched, the cumulative change
/// of the whole local range is compared with each of them to find a squash.
pub fn match_diverged_commits(
    repo: &Path,
    local: &CommitRange,
    remote: &CommitRange,
) -> Result<DivergenceMatch> {
    let local_hashes = git::list_commit_hashes(repo, &local.rev_range(), None)?;
    let remote_hashes = git::list_commit_hashes(repo, &remote.rev_range(), None)?;

    let mut local_by_fp: HashMap<PatchFingerprint, String> = HashMap::new();
    for (hash, fp) in fingerprint_commits(repo, &local_hashes)? {
        local_by_fp.entry(fp).or_insert(hash);
    }

    let mut result = DivergenceMatch::default();
    let mut unmatched = Vec::new();
    for (remote_hash, fp) in fingerprint_commits(repo, &remote_hashes)? {
        match local_by_fp.remove(&fp) {
            Some(local_hash) => {
                result.rebase_matches.insert(remote_hash, local_hash);
            }
            None => unmatched.push((remote_hash, fp)),
        }
    }

    if local_hashes.len() > 1 && !unmatched.is_empty() {
        if let Some(cumulative) = range_fingerprint(repo, local)? {
            if let Some((remote_hash, _)) = unmatched.iter().find(|(_, fp)| *fp == cumulative) {
                result.squash_match = Some(SquashMatch {
                    remote_hash: remote_hash.clone(),
                    local_hashes: local_hashes.clone(),
                });
            }
        }
    }

    debug!(
        "correlated {} local / {} remote commits: {} rebased, squash: {}",
        local_hashes.len(),
        remote_hashes.len(),
        result.rebase_matches.len(),
        result.squash_match.is_some()
    );
    Ok(result)
}

/// Count the local commits that would still need replaying when moving
/// `local` from `old_base` onto `new_base`.
///
/// A local commit whose change already appears among the commits between the
/// two bases is already on the target.
pub fn analyze_retarget_replay(
    repo: &Path,
    old_base: &str,
    new_base: &str,
    local: &CommitRange,
) -> Result<RetargetReplay> {
    let local_hashes = git::list_commit_hashes(repo, &local.rev_range(), None)?;
    let target_hashes =
        git::list_commit_hashes(repo, &format!("{}..{}", old_base, new_base), None)?;

    let on_target: HashSet<PatchFingerprint> = fingerprint_commits(repo, &target_hashes)?
        .into_iter()
        .map(|(_, fp)| fp)
        .collect();

    let total_local = local_hashes.len() as u32;
    let already_on_target = fingerprint_commits(repo, &local_hashes)?
        .iter()
        .filter(|(_, fp)| on_target.contains(fp))
        .count() as u32;

    Ok(RetargetReplay::new(total_local, already_on_target))
}
