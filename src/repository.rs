//! # Repository Access
//!
//! This module provides the `RepositoryManager`, the handle the orchestrator
//! uses to talk to member repositories. It separates *what* is asked of a
//! repository from *how* the answer is obtained, through two traits:
//!
//! - **`GitOperations`**: remote enumeration, the push-default setting and
//!   fetching. These feed remote role resolution and the fetch phase.
//!
//! - **`StatusOperations`**: building a full [`RepoStatus`] for one repository
//!   once its remote roles are known.
//!
//! In the application `DefaultGitOperations` and `DefaultStatusOperations` are
//! used, which call the real `git` binary. Tests swap in mock implementations
//! to simulate slow repositories, failing fetches or ambiguous remotes without
//! creating any repository on disk.
//!
//! Remote roles are memoized in a [`RoleCache`] owned by the manager, so one
//! manager corresponds to one command invocation.

use std::path::Path;

use log::debug;

use crate::cache::RoleCache;
use crate::error::{Error, Result};
use crate::interrupt::CancelToken;
use crate::model::RepoStatus;
use crate::remotes::{resolve_remote_roles, RemoteRoles};
use crate::status::StatusRequest;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Names of the remotes configured in the repository.
    fn remote_names(&self, repo: &Path) -> Result<Vec<String>>;

    /// The `remote.pushDefault` setting, if any.
    fn push_default(&self, repo: &Path) -> Result<Option<String>>;

    /// Update remote-tracking refs of one remote. A failed fetch is an error.
    fn fetch(&self, repo: &Path, remote: &str, token: &CancelToken) -> Result<()>;
}

/// Trait for building a repository's status - allows mocking in tests
pub trait StatusOperations: Send + Sync {
    fn gather(
        &self,
        repo: &Path,
        name: &str,
        roles: Option<&RemoteRoles>,
        request: &StatusRequest,
        token: &CancelToken,
    ) -> Result<RepoStatus>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn remote_names(&self, repo: &Path) -> Result<Vec<String>> {
        crate::git::remote_names(repo)
    }

    fn push_default(&self, repo: &Path) -> Result<Option<String>> {
        crate::git::config_get(repo, "remote.pushDefault")
    }

    fn fetch(&self, repo: &Path, remote: &str, token: &CancelToken) -> Result<()> {
        let out = crate::git::fetch(repo, remote, token)?;
        if out.success() {
            Ok(())
        } else {
            Err(Error::GitCommand {
                command: format!("fetch --prune --quiet {}", remote),
                repo: repo.display().to_string(),
                stderr: out.stderr.trim().to_string(),
            })
        }
    }
}

/// The default implementation of `StatusOperations`, backed by
/// [`crate::status::gather_repo_status`].
pub struct DefaultStatusOperations;

impl StatusOperations for DefaultStatusOperations {
    fn gather(
        &self,
        repo: &Path,
        name: &str,
        roles: Option<&RemoteRoles>,
        request: &StatusRequest,
        token: &CancelToken,
    ) -> Result<RepoStatus> {
        crate::status::gather_repo_status(repo, name, roles, request, token)
    }
}

/// Entry point for querying member repositories during one command.
pub struct RepositoryManager {
    git_ops: Box<dyn GitOperations>,
    status_ops: Box<dyn StatusOperations>,
    roles: RoleCache,
}

impl RepositoryManager {
    /// Creates a manager backed by the system `git` with an empty role cache.
    pub fn new() -> Self {
        Self {
            git_ops: Box::new(DefaultGitOperations),
            status_ops: Box::new(DefaultStatusOperations),
            roles: RoleCache::new(),
        }
    }

    /// Creates a `RepositoryManager` with custom operation implementations.
    ///
    /// This is primarily used for testing to inject mock operations.
    #[cfg(test)]
    pub fn with_operations(
        git_ops: Box<dyn GitOperations>,
        status_ops: Box<dyn StatusOperations>,
    ) -> Self {
        Self {
            git_ops,
            status_ops,
            roles: RoleCache::new(),
        }
    }

    /// Remote roles of a repository, resolved once and then served from cache.
    ///
    /// `Ok(None)` means the repository has no remotes at all.
    pub fn remote_roles(&self, repo: &Path) -> Result<Option<RemoteRoles>> {
        self.roles.get_or_resolve(repo, || {
            debug!("resolving remote roles for {}", repo.display());
            let remotes = self.git_ops.remote_names(repo)?;
            let push_default = self.git_ops.push_default(repo)?;
            resolve_remote_roles(&remotes, push_default.as_deref())
        })
    }

    /// Fetch the share and base remotes of a repository.
    ///
    /// The role cache entry is dropped afterwards whatever the outcome, since a
    /// fetch can add or prune the refs that resolution looked at.
    pub fn fetch_repo(&self, repo: &Path, token: &CancelToken) -> Result<()> {
        let result = self.fetch_roles(repo, token);
        self.roles.invalidate(repo)?;
        result
    }

    fn fetch_roles(&self, repo: &Path, token: &CancelToken) -> Result<()> {
        let Some(roles) = self.remote_roles(repo)? else {
            debug!("{} has no remotes, nothing to fetch", repo.display());
            return Ok(());
        };
        for remote in roles.distinct() {
            token.check()?;
            self.git_ops.fetch(repo, remote, token)?;
        }
        Ok(())
    }

    /// Resolve roles (through the cache) and gather a full status.
    pub fn repo_status(
        &self,
        repo: &Path,
        name: &str,
        request: &StatusRequest,
        token: &CancelToken,
    ) -> Result<RepoStatus> {
        token.check()?;
        let roles = self.remote_roles(repo)?;
        self.status_ops
            .gather(repo, name, roles.as_ref(), request, token)
    }

    /// The role cache of this invocation.
    pub fn role_cache(&self) -> &RoleCache {
        &self.roles
    }
}

impl Default for RepositoryManager {
    fn default() -> Self {
        Self::new()
    }
}
