//! # Derived Flags
//!
//! A [`RepoFlags`] set is a pure function of a [`RepoStatus`] and the branch
//! the workspace expects. [`compute_flags`] is total: every status yields a
//! flag set, including a repository with neither base nor share information.

use std::fmt;

use crate::model::{ConflictVerdict, HeadMode, RepoStatus, ShareRefMode};

/// One derived boolean, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    Dirty,
    Unpushed,
    BehindShare,
    BehindBase,
    Diverged,
    Drifted,
    Detached,
    Operation,
    Local,
    Gone,
    Shallow,
    Merged,
    BaseMerged,
    BaseMissing,
    AtRisk,
}

impl Flag {
    pub const ALL: [Flag; 15] = [
        Flag::Dirty,
        Flag::Unpushed,
        Flag::BehindShare,
        Flag::BehindBase,
        Flag::Diverged,
        Flag::Drifted,
        Flag::Detached,
        Flag::Operation,
        Flag::Local,
        Flag::Gone,
        Flag::Shallow,
        Flag::Merged,
        Flag::BaseMerged,
        Flag::BaseMissing,
        Flag::AtRisk,
    ];

    /// Name used in filter expressions and status labels.
    pub fn name(self) -> &'static str {
        match self {
            Flag::Dirty => "dirty",
            Flag::Unpushed => "unpushed",
            Flag::BehindShare => "behind-share",
            Flag::BehindBase => "behind-base",
            Flag::Diverged => "diverged",
            Flag::Drifted => "drifted",
            Flag::Detached => "detached",
            Flag::Operation => "operation",
            Flag::Local => "local",
            Flag::Gone => "gone",
            Flag::Shallow => "shallow",
            Flag::Merged => "merged",
            Flag::BaseMerged => "base-merged",
            Flag::BaseMissing => "base-missing",
            Flag::AtRisk => "at-risk",
        }
    }

    /// Parse a flag name. Accepts kebab-case and camelCase spellings.
    pub fn from_name(name: &str) -> Option<Flag> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Flag::ALL
            .into_iter()
            .find(|flag| flag.name().replace('-', "") == normalized)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepoFlags {
    pub dirty: bool,
    pub unpushed: bool,
    pub behind_share: bool,
    pub behind_base: bool,
    pub diverged: bool,
    pub drifted: bool,
    pub detached: bool,
    pub operation: bool,
    pub local: bool,
    pub gone: bool,
    pub shallow: bool,
    pub merged: bool,
    pub base_merged: bool,
    pub base_missing: bool,
    pub at_risk: bool,
}

impl RepoFlags {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Dirty => self.dirty,
            Flag::Unpushed => self.unpushed,
            Flag::BehindShare => self.behind_share,
            Flag::BehindBase => self.behind_base,
            Flag::Diverged => self.diverged,
            Flag::Drifted => self.drifted,
            Flag::Detached => self.detached,
            Flag::Operation => self.operation,
            Flag::Local => self.local,
            Flag::Gone => self.gone,
            Flag::Shallow => self.shallow,
            Flag::Merged => self.merged,
            Flag::BaseMerged => self.base_merged,
            Flag::BaseMissing => self.base_missing,
            Flag::AtRisk => self.at_risk,
        }
    }

    /// Flags that are set, in canonical order.
    pub fn set_flags(&self) -> Vec<Flag> {
        Flag::ALL.into_iter().filter(|f| self.get(*f)).collect()
    }
}

/// Derive the flag set of `status` for a workspace expecting `expected_branch`.
pub fn compute_flags(status: &RepoStatus, expected_branch: &str) -> RepoFlags {
    let base = status.base.as_ref();
    let share = status.share.as_ref();

    let ahead = base.map_or(0, |b| b.ahead);
    let behind = base.map_or(0, |b| b.behind);
    let merged = base.is_some_and(|b| b.merged_into_base.is_some());
    let base_merged = base.is_some_and(|b| b.base_merged_into_default.is_some());
    let diverged = ahead > 0 && behind > 0;

    let untracked_share = share.is_some_and(|s| {
        matches!(s.ref_mode, ShareRefMode::NoRef | ShareRefMode::Gone)
    });
    let unpushed = share.is_some_and(|s| s.to_push.unwrap_or(0) > 0)
        || (untracked_share && ahead > 0 && !merged);

    let conflict_risk = matches!(
        base.map(|b| b.conflict),
        Some(ConflictVerdict::Conflict | ConflictVerdict::Unknown)
    );

    RepoFlags {
        dirty: status.local.is_dirty(),
        unpushed,
        behind_share: share.is_some_and(|s| s.effective_to_pull() > 0),
        behind_base: behind > 0,
        diverged,
        drifted: matches!(&status.identity.head_mode, HeadMode::Attached { branch } if branch != expected_branch),
        detached: matches!(status.identity.head_mode, HeadMode::Detached),
        operation: status.operation.is_some(),
        local: base.is_none() && share.is_none(),
        gone: share.is_some_and(|s| s.ref_mode == ShareRefMode::Gone),
        shallow: status.identity.shallow,
        merged,
        base_merged,
        base_missing: base.is_some_and(|b| b.is_fallen_back()),
        at_risk: (diverged && conflict_risk) || base_merged,
    }
}
