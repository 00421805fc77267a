//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use git_fleet::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("{}", err);
//!
//! // Use:
//! return Err(suggestions::for_error(&err));
//! ```

use std::path::Path;

use crate::defaults::CONFIG_FILENAME;
use crate::error::Error;

/// Generate an error for when the workspace directory does not exist.
pub fn workspace_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Workspace directory not found: {path}\n\n\
         hint: Use --workspace <DIR> to point at the workspace\n\
         hint: Set the GIT_FLEET_WORKSPACE environment variable",
        path = path.display()
    )
}

/// Generate an error for an invalid `--where` expression.
pub fn invalid_filter(term: &str, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid filter term '{term}': {message}\n\n\
         hint: Join flags with '+' for AND and ',' for OR, e.g. 'dirty+unpushed,at-risk'\n\
         hint: Prefix a flag with '^' to negate it, e.g. '^detached'"
    )
}

/// Generate an error for ambiguous remote roles.
pub fn ambiguous_remotes(message: &str, remotes: &[String]) -> anyhow::Error {
    anyhow::anyhow!(
        "{message} (remotes: {remotes})\n\n\
         hint: Set the push remote with 'git config remote.pushDefault <remote>'\n\
         hint: Name the source of truth 'upstream' and your fork 'origin'",
        remotes = remotes.join(", ")
    )
}

/// Generate an error for a missing or malformed workspace file.
pub fn config_error(message: &str, hint: Option<&str>) -> anyhow::Error {
    let hint = hint
        .map(String::from)
        .unwrap_or_else(|| format!("Check the syntax of {}", CONFIG_FILENAME));
    anyhow::anyhow!("Workspace configuration error: {message}\n\nhint: {hint}")
}

/// Convert a library error into a user-facing error, adding hints where one
/// helps.
pub fn for_error(err: &Error) -> anyhow::Error {
    match err {
        Error::InvalidFilter { term, message } => invalid_filter(term, message),
        Error::AmbiguousRemotes { message, remotes } => ambiguous_remotes(message, remotes),
        Error::Config { message, hint } => config_error(message, hint.as_deref()),
        Error::Yaml(e) => config_error(&e.to_string(), None),
        Error::GitLaunch { .. } => anyhow::anyhow!(
            "{err}\n\nhint: Make sure git is installed and on your PATH"
        ),
        Error::RepoNotFound { path } => anyhow::anyhow!(
            "Repository not found: {path}\n\n\
             hint: Check the 'repos' list in {CONFIG_FILENAME}\n\
             hint: Remove 'repos' to use every git repository in the workspace"
        ),
        other => anyhow::anyhow!("{other}"),
    }
}
