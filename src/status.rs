//! # Repository Status
//!
//! Builds a [`RepoStatus`] for one repository from read-only git queries:
//! identity, working tree changes, in-progress operation, divergence from the
//! base branch and divergence from the share branch.
//!
//! ## Base fallback
//!
//! When a configured base branch no longer exists on the base remote, the
//! remote's default branch is used instead and the configured name is kept in
//! `configuredRef`. Before reporting the base as missing, these are checked
//! for signs that it was merged into the default branch, in order:
//!
//! 1. a local branch of the configured name;
//! 2. the configured name on the share remote, when it differs from the base
//!    remote (a fork that has not pruned it yet);
//! 3. the fork point of `HEAD`: if it joined the default branch through a merge
//!    commit instead of lying on its first-parent line, the base was merged.
//!
//! A base that was fast-forwarded into the default branch, or squash-merged
//! with no surviving ref, leaves none of these behind and is reported as
//! missing.
//!
//! ## Merged detection
//!
//! `mergedIntoBase` is only computed when the branch has commits the base
//! lacks or its share ref is gone. A branch merged with a merge commit whose
//! share ref still exists shows up as behind the base instead, which keeps a
//! freshly created branch from being called merged.

use std::path::Path;

use log::{debug, warn};

use crate::conflict::{predict_merge_conflict, verdict};
use crate::correlation::{detect_merge, match_diverged_commits, CommitRange};
use crate::defaults::DEFAULT_COMMIT_LIMIT;
use crate::error::Result;
use crate::git;
use crate::interrupt::CancelToken;
use crate::model::{
    BaseInfo, ConflictVerdict, HeadMode, Identity, LocalChanges, MergeKind, OperationKind,
    RepoStatus, ShareInfo, ShareRefMode, WorktreeKind,
};
use crate::remotes::RemoteRoles;

/// What a status query compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    /// Branch every repository is expected to be on.
    pub branch: String,
    /// Configured base branch; the base remote's default branch when `None`.
    pub base: Option<String>,
    /// Window for squash detection.
    pub commit_limit: usize,
}

impl StatusRequest {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            base: None,
            commit_limit: DEFAULT_COMMIT_LIMIT,
        }
    }

    pub fn with_base(mut self, base: Option<String>) -> Self {
        self.base = base;
        self
    }

    pub fn with_commit_limit(mut self, limit: usize) -> Self {
        self.commit_limit = limit;
        self
    }
}

/// Gather the full status of the repository at `repo`.
pub fn gather_repo_status(
    repo: &Path,
    name: &str,
    roles: Option<&RemoteRoles>,
    request: &StatusRequest,
    token: &CancelToken,
) -> Result<RepoStatus> {
    let identity = gather_identity(repo)?;
    let local = parse_porcelain(&git::status_porcelain(repo)?);
    let operation = detect_operation(&git::absolute_git_dir(repo)?);
    let head = git::resolve_ref(repo, "HEAD")?;
    token.check()?;

    let share = match (roles, identity.head_mode.branch()) {
        (Some(roles), Some(branch)) => Some(gather_share(
            repo,
            &roles.share,
            branch,
            head.as_deref(),
        )?),
        _ => None,
    };
    token.check()?;

    let share_gone = share
        .as_ref()
        .is_some_and(|s| s.ref_mode == ShareRefMode::Gone);
    let base = match roles {
        Some(roles) => gather_base(repo, roles, request, head.as_deref(), share_gone)?,
        None => None,
    };

    let last_commit_timestamp = git::last_commit_timestamp(repo)?;

    Ok(RepoStatus {
        name: name.to_string(),
        identity,
        local,
        base,
        share,
        operation,
        last_commit_timestamp,
    })
}

fn gather_identity(repo: &Path) -> Result<Identity> {
    let worktree_kind = if repo.join(".git").is_file() {
        WorktreeKind::Linked
    } else {
        WorktreeKind::Full
    };
    let head_mode = match git::symbolic_head(repo)? {
        Some(branch) => HeadMode::Attached { branch },
        None => HeadMode::Detached,
    };
    Ok(Identity {
        worktree_kind,
        head_mode,
        shallow: git::is_shallow(repo)?,
    })
}

/// Count changes in `git status --porcelain=v1 -z` output.
pub fn parse_porcelain(raw: &str) -> LocalChanges {
    let mut changes = LocalChanges::default();
    let mut entries = raw.split('\0').filter(|e| !e.is_empty());

    while let Some(entry) = entries.next() {
        let mut code = entry.chars();
        let (Some(x), Some(y)) = (code.next(), code.next()) else {
            continue;
        };
        // Renames and copies carry the original path as a separate entry.
        if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            entries.next();
        }

        match (x, y) {
            ('?', '?') => changes.untracked += 1,
            ('!', '!') => {}
            ('D', 'D') | ('A', 'U') | ('U', 'D') | ('U', 'A') | ('D', 'U') | ('A', 'A')
            | ('U', 'U') => changes.conflicts += 1,
            _ => {
                if x != ' ' {
                    changes.staged += 1;
                }
                if y != ' ' {
                    changes.modified += 1;
                }
            }
        }
    }
    changes
}

/// Detect an in-progress operation from control files in the git directory.
pub fn detect_operation(git_dir: &Path) -> Option<OperationKind> {
    if git_dir.join("rebase-merge").is_dir() {
        return Some(OperationKind::Rebase);
    }
    let rebase_apply = git_dir.join("rebase-apply");
    if rebase_apply.is_dir() {
        return Some(if rebase_apply.join("applying").exists() {
            OperationKind::Am
        } else {
            OperationKind::Rebase
        });
    }
    [
        ("MERGE_HEAD", OperationKind::Merge),
        ("CHERRY_PICK_HEAD", OperationKind::CherryPick),
        ("REVERT_HEAD", OperationKind::Revert),
        ("BISECT_LOG", OperationKind::Bisect),
    ]
    .into_iter()
    .find(|(file, _)| git_dir.join(file).exists())
    .map(|(_, kind)| kind)
}

fn remote_ref(remote: &str, branch: &str) -> String {
    format!("refs/remotes/{}/{}", remote, branch)
}

fn gather_share(
    repo: &Path,
    remote: &str,
    branch: &str,
    head: Option<&str>,
) -> Result<ShareInfo> {
    let upstream_remote = git::config_get(repo, &format!("branch.{}.remote", branch))?;
    let upstream_merge = git::config_get(repo, &format!("branch.{}.merge", branch))?;

    let (ref_name, ref_mode) = match (upstream_remote.as_deref(), upstream_merge) {
        (Some(r), Some(merge)) if r == remote => {
            let name = merge
                .strip_prefix("refs/heads/")
                .unwrap_or(&merge)
                .to_string();
            let mode = if git::ref_exists(repo, &remote_ref(remote, &name))? {
                ShareRefMode::Configured
            } else {
                ShareRefMode::Gone
            };
            (Some(name), mode)
        }
        _ if git::ref_exists(repo, &remote_ref(remote, branch))? => {
            (Some(branch.to_string()), ShareRefMode::Implicit)
        }
        _ => (None, ShareRefMode::NoRef),
    };

    let mut share = ShareInfo {
        remote: remote.to_string(),
        r#ref: ref_name.clone(),
        ref_mode,
        to_push: None,
        to_pull: None,
        rebased: None,
        superseded: None,
    };

    let tracking = matches!(ref_mode, ShareRefMode::Configured | ShareRefMode::Implicit);
    if let (true, Some(name), Some(head)) = (tracking, ref_name, head) {
        let share_ref = remote_ref(remote, &name);
        let (to_push, to_pull) = git::ahead_behind(repo, head, &share_ref)?;
        let (rebased, superseded) = if to_push > 0 && to_pull > 0 {
            let m = match_diverged_commits(
                repo,
                &CommitRange::new(&share_ref, head),
                &CommitRange::new(head, &share_ref),
            )?;
            (m.matched_local() as u32, m.matched_remote() as u32)
        } else {
            (0, 0)
        };
        debug!(
            "{} vs {}: +{} -{} (rebased {})",
            branch, share_ref, to_push, to_pull, rebased
        );
        share.to_push = Some(to_push);
        share.to_pull = Some(to_pull);
        share.rebased = Some(rebased);
        share.superseded = Some(superseded);
    }
    Ok(share)
}

fn gather_base(
    repo: &Path,
    roles: &RemoteRoles,
    request: &StatusRequest,
    head: Option<&str>,
    share_gone: bool,
) -> Result<Option<BaseInfo>> {
    let remote = roles.base.as_str();
    let default_branch = git::remote_default_branch(repo, remote)?;

    let (ref_name, configured_ref) = match (&request.base, default_branch.as_deref()) {
        (Some(base), _) if git::ref_exists(repo, &remote_ref(remote, base))? => {
            (base.clone(), None)
        }
        (Some(base), Some(default)) => {
            warn!(
                "{}: base '{}' not found on {}, using '{}'",
                repo.display(),
                base,
                remote,
                default
            );
            (default.to_string(), Some(base.clone()))
        }
        (None, Some(default)) => (default.to_string(), None),
        (_, None) => {
            debug!("{}: no base branch on {}", repo.display(), remote);
            return Ok(None);
        }
    };

    let Some(base_tip) = git::resolve_ref(repo, &remote_ref(remote, &ref_name))? else {
        return Ok(None);
    };

    let (ahead, behind) = match head {
        Some(head) => git::ahead_behind(repo, head, &base_tip)?,
        None => (0, git::count_commits(repo, &base_tip)?),
    };

    let merged_into_base = match head {
        Some(head) if ahead > 0 || share_gone => {
            detect_merge(repo, head, &base_tip, request.commit_limit)?
        }
        _ => None,
    };

    let base_merged_into_default = match &configured_ref {
        Some(configured) => {
            base_merged_evidence(repo, roles, configured, head, &base_tip, request.commit_limit)?
        }
        None => None,
    };

    let conflict = match head {
        Some(head) if ahead > 0 && behind > 0 => {
            verdict(predict_merge_conflict(repo, head, &base_tip)?.as_ref())
        }
        _ => ConflictVerdict::NotChecked,
    };

    Ok(Some(BaseInfo {
        remote: remote.to_string(),
        r#ref: ref_name,
        configured_ref,
        ahead,
        behind,
        merged_into_base,
        base_merged_into_default,
        conflict,
    }))
}

/// Look for signs that a configured base which vanished from the base remote
/// was merged into the default branch at `default_tip`.
fn base_merged_evidence(
    repo: &Path,
    roles: &RemoteRoles,
    configured: &str,
    head: Option<&str>,
    default_tip: &str,
    commit_limit: usize,
) -> Result<Option<MergeKind>> {
    let mut candidates = vec![format!("refs/heads/{}", configured)];
    if roles.share != roles.base {
        candidates.push(remote_ref(&roles.share, configured));
    }
    for candidate in &candidates {
        if let Some(tip) = git::resolve_ref(repo, candidate)? {
            if let Some(kind) = detect_merge(repo, &tip, default_tip, commit_limit)? {
                debug!("{}: {} merged into default ({:?})", repo.display(), candidate, kind);
                return Ok(Some(kind));
            }
        }
    }

    // Without a surviving ref, fall back to history: a fork point that reached
    // the default branch through a merge commit rather than its first-parent
    // line came from another branch.
    let Some(head) = head else {
        return Ok(None);
    };
    let Some(fork_point) = git::merge_base(repo, head, default_tip)? else {
        return Ok(None);
    };
    if git::on_first_parent_chain(repo, &fork_point, default_tip)? {
        return Ok(None);
    }
    debug!(
        "{}: fork point {} joined the default branch through a merge",
        repo.display(),
        fork_point
    );
    Ok(Some(MergeKind::Merge))
}
