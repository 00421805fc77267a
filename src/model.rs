//! # Status Model
//!
//! Serializable shapes exposed to presentation layers: per-repository status,
//! the workspace summary, conflict predictions and commit correlation results.
//!
//! Every type here is plain data. There are no handles, no color codes and no
//! padding, so the same values back the text renderer, the JSON output and the
//! generated JSON Schema (see [`crate::schema`]). Field names serialize in
//! camelCase; variant-dependent shapes (head mode, share ref mode) are tagged
//! enums instead of optional fields with implicit meaning.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A commit as reported by git. Produced by the gateway, never built by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub subject: String,
}

/// How one history was integrated into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MergeKind {
    /// Fast-forward or merge commit: the tip is an ancestor of the target.
    Merge,
    /// The branch's cumulative change landed as a single commit.
    Squash,
}

/// Outcome of a merge simulation as recorded in a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ConflictVerdict {
    /// No simulation was run (the repository has not diverged).
    #[default]
    NotChecked,
    Clean,
    Conflict,
    /// The simulation gave neither a clean nor a conflicting answer.
    Unknown,
}

/// Divergence from the base branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaseInfo {
    pub remote: String,
    /// Branch name on `remote` the comparison ran against.
    pub r#ref: String,
    /// The configured base name when it no longer resolved and `ref` is a substitute.
    pub configured_ref: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub merged_into_base: Option<MergeKind>,
    pub base_merged_into_default: Option<MergeKind>,
    #[serde(default)]
    pub conflict: ConflictVerdict,
}

impl BaseInfo {
    /// The configured base ref no longer resolves and was not merged upstream.
    pub fn is_fallen_back(&self) -> bool {
        self.configured_ref.is_some() && self.base_merged_into_default.is_none()
    }
}

/// How the share ref for the current branch was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ShareRefMode {
    /// Nothing on the share remote tracks this branch.
    NoRef,
    /// `<share>/<branch>` exists but no upstream is configured.
    Implicit,
    /// A configured upstream exists on the share remote.
    Configured,
    /// A configured upstream whose remote ref has been deleted.
    Gone,
}

/// Divergence from the branch on the share (push) remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareInfo {
    pub remote: String,
    pub r#ref: Option<String>,
    pub ref_mode: ShareRefMode,
    /// Raw count of local commits missing from the share ref.
    pub to_push: Option<u32>,
    /// Raw count of share commits missing locally.
    pub to_pull: Option<u32>,
    /// Local-only commits matched by fingerprint to remote-only commits.
    pub rebased: Option<u32>,
    /// Remote-only commits accounted for by those local rewrites.
    pub superseded: Option<u32>,
}

impl ShareInfo {
    /// Remote-only commits that are not old versions of local commits.
    pub fn effective_to_pull(&self) -> u32 {
        self.to_pull
            .unwrap_or(0)
            .saturating_sub(self.superseded.unwrap_or(0))
    }
}

/// Working tree change counts.
///
/// A conflicted path counts only as a conflict. A path with both staged and
/// unstaged edits counts once in each of `staged` and `modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalChanges {
    pub staged: u32,
    pub modified: u32,
    pub untracked: u32,
    pub conflicts: u32,
}

impl LocalChanges {
    pub fn is_dirty(&self) -> bool {
        self.staged + self.modified + self.untracked + self.conflicts > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WorktreeKind {
    Full,
    Linked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HeadMode {
    Attached { branch: String },
    Detached,
}

impl HeadMode {
    pub fn branch(&self) -> Option<&str> {
        match self {
            HeadMode::Attached { branch } => Some(branch),
            HeadMode::Detached => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub worktree_kind: WorktreeKind,
    pub head_mode: HeadMode,
    pub shallow: bool,
}

/// An in-progress git operation, detected from control files in the git dir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Rebase,
    Merge,
    CherryPick,
    Revert,
    Bisect,
    Am,
}

/// Everything the engine knows about one repository, gathered fresh per command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepoStatus {
    pub name: String,
    pub identity: Identity,
    pub local: LocalChanges,
    pub base: Option<BaseInfo>,
    pub share: Option<ShareInfo>,
    pub operation: Option<OperationKind>,
    /// Committer timestamp (unix seconds) of HEAD; `None` for an unborn branch.
    pub last_commit_timestamp: Option<i64>,
}

/// Which phase of a command a per-repository failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FailurePhase {
    Fetch,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepoFailure {
    pub phase: FailurePhase,
    pub message: String,
}

/// One slot of the workspace summary. A failed status still occupies its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepoReport {
    pub name: String,
    pub status: Option<RepoStatus>,
    pub error: Option<RepoFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    pub workspace: String,
    pub branch: String,
    pub base: Option<String>,
    pub repos: Vec<RepoReport>,
    pub total: usize,
    pub at_risk_count: usize,
    /// Labels of flags set in at least one repository, in canonical flag order.
    pub status_labels: Vec<String>,
    /// Most recent `lastCommitTimestamp` across repositories.
    pub last_commit: Option<i64>,
}

impl WorkspaceSummary {
    /// Whether any repository recorded a fetch or status failure.
    pub fn has_failures(&self) -> bool {
        self.repos.iter().any(|r| r.error.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPrediction {
    pub has_conflict: bool,
    pub conflicting_files: Vec<String>,
}

/// A commit that would conflict when replayed, with the paths involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitConflict {
    pub commit: Commit,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SquashMatch {
    pub remote_hash: String,
    pub local_hashes: Vec<String>,
}

/// Correlation of local-only and remote-only commits after a history rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceMatch {
    /// Remote hash to the local hash carrying the same change.
    pub rebase_matches: BTreeMap<String, String>,
    pub squash_match: Option<SquashMatch>,
}

impl DivergenceMatch {
    /// Distinct local commits accounted for by a remote counterpart.
    pub fn matched_local(&self) -> usize {
        let mut local: BTreeSet<&str> = self.rebase_matches.values().map(String::as_str).collect();
        if let Some(squash) = &self.squash_match {
            local.extend(squash.local_hashes.iter().map(String::as_str));
        }
        local.len()
    }

    /// Remote commits accounted for by a local counterpart.
    pub fn matched_remote(&self) -> usize {
        self.rebase_matches.len() + usize::from(self.squash_match.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetargetReplay {
    pub total_local: u32,
    pub already_on_target: u32,
    pub to_replay: u32,
}

impl RetargetReplay {
    /// `already_on_target` is clamped to `total_local`.
    pub fn new(total_local: u32, already_on_target: u32) -> Self {
        let already_on_target = already_on_target.min(total_local);
        Self {
            total_local,
            already_on_target,
            to_replay: total_local - already_on_target,
        }
    }
}
