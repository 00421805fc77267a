//! # Workspace Configuration
//!
//! A workspace is a directory holding member repositories plus a
//! `.git-fleet.yaml` file naming the branch the workspace tracks:
//!
//! ```yaml
//! branch: feature/login        # required
//! base: release/2.0            # optional, defaults to the remote's default branch
//! repos: [api, web, shared]    # optional, defaults to every child git repository
//! commit_limit: 200            # optional, squash detection window
//! ```
//!
//! Member paths are relative to the workspace directory. Without an explicit
//! `repos` list, the immediate subdirectories that are git repositories are
//! used, sorted by name.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::defaults::{CONFIG_FILENAME, DEFAULT_COMMIT_LIMIT};
use crate::error::{Error, Result};
use crate::git::is_git_repo;
use crate::orchestrator::RepoTarget;
use crate::status::StatusRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Feature branch every member is expected to be on.
    pub branch: String,
    /// Base branch the feature branch diverges from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Member directories; discovered when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_limit: Option<usize>,
}

impl WorkspaceConfig {
    pub fn commit_limit(&self) -> usize {
        self.commit_limit.unwrap_or(DEFAULT_COMMIT_LIMIT)
    }

    /// The status query this workspace asks for.
    pub fn request(&self) -> StatusRequest {
        StatusRequest::new(&self.branch)
            .with_base(self.base.clone())
            .with_commit_limit(self.commit_limit())
    }

    /// Member names with their paths under `workspace_dir`, unvalidated.
    pub fn member_paths(&self, workspace_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let names = match &self.repos {
            Some(repos) => repos.clone(),
            None => discover_repos(workspace_dir)?,
        };
        Ok(names
            .into_iter()
            .map(|name| {
                let path = workspace_dir.join(&name);
                (name, path)
            })
            .collect())
    }

    /// Member repositories, validated to exist and be git repositories.
    pub fn targets(&self, workspace_dir: &Path) -> Result<Vec<RepoTarget>> {
        self.member_paths(workspace_dir)?
            .into_iter()
            .map(|(name, path)| {
                if !is_git_repo(&path) {
                    return Err(Error::RepoNotFound {
                        path: path.display().to_string(),
                    });
                }
                Ok(RepoTarget::new(name, path))
            })
            .collect()
    }
}

/// Parse and validate a workspace file.
pub fn parse(yaml_content: &str) -> Result<WorkspaceConfig> {
    let config: WorkspaceConfig = serde_yaml::from_str(yaml_content)?;

    if config.branch.trim().is_empty() {
        return Err(Error::Config {
            message: "'branch' must not be empty".to_string(),
            hint: Some(format!("Set 'branch: <name>' in {}", CONFIG_FILENAME)),
        });
    }
    if config.base.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(Error::Config {
            message: "'base' must not be empty".to_string(),
            hint: Some("Remove 'base' to use the remote's default branch".to_string()),
        });
    }
    if config.commit_limit == Some(0) {
        return Err(Error::Config {
            message: "'commit_limit' must be at least 1".to_string(),
            hint: None,
        });
    }
    Ok(config)
}

/// Parse a workspace file from a path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<WorkspaceConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Load the workspace file of `workspace_dir`.
pub fn load(workspace_dir: &Path) -> Result<WorkspaceConfig> {
    let path = workspace_dir.join(CONFIG_FILENAME);
    if !path.is_file() {
        return Err(Error::Config {
            message: format!("{} not found in {}", CONFIG_FILENAME, workspace_dir.display()),
            hint: Some(format!(
                "Create {} containing 'branch: <name>', or pass --workspace <DIR>",
                CONFIG_FILENAME
            )),
        });
    }
    debug!("loading workspace config from {}", path.display());
    from_file(&path)
}

/// Immediate subdirectories of `workspace_dir` that are git repositories, by name.
pub fn discover_repos(workspace_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(workspace_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if entry.file_type().is_dir() && is_git_repo(entry.path()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    debug!("discovered {} repositories in {}", names.len(), workspace_dir.display());
    Ok(names)
}
