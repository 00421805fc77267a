//! In-process memoization of remote role resolution
//!
//! Entries live for one command invocation and are never persisted. A fetch
//! invalidates the entry of every repository it touched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::remotes::RemoteRoles;

/// Per-repository cache of resolved remote roles, keyed by repository path.
///
/// `None` values are cached too: a repository without remotes stays without
/// remotes until something invalidates it.
#[derive(Debug, Clone, Default)]
pub struct RoleCache {
    cache: Arc<Mutex<HashMap<PathBuf, Option<RemoteRoles>>>>,
}

impl RoleCache {
    /// Create a new empty role cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<PathBuf, Option<RemoteRoles>>>> {
        self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "remote role cache".to_string(),
        })
    }

    /// Get the cached roles for `repo`, or resolve and cache them.
    ///
    /// Resolution errors are returned as-is and not cached.
    pub fn get_or_resolve<F>(&self, repo: &Path, resolver: F) -> Result<Option<RemoteRoles>>
    where
        F: FnOnce() -> Result<Option<RemoteRoles>>,
    {
        {
            let cache = self.lock()?;
            if let Some(cached) = cache.get(repo) {
                return Ok(cached.clone());
            }
        }

        // Resolve without holding the lock so other repositories proceed.
        let roles = resolver()?;

        self.lock()?.insert(repo.to_path_buf(), roles.clone());
        Ok(roles)
    }

    /// Drop the entry for `repo`, if any.
    pub fn invalidate(&self, repo: &Path) -> Result<()> {
        self.lock()?.remove(repo);
        Ok(())
    }

    /// Check if an entry exists for `repo`
    pub fn contains(&self, repo: &Path) -> Result<bool> {
        Ok(self.lock()?.contains_key(repo))
    }

    /// Clear all cached entries
    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    /// Get the number of cached entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}
