//! # CLI Command Implementations
//!
//! Each subcommand lives in its own file and contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, calls into the
//!   `git_fleet` library and renders the result.
//!
//! Commands that touch repositories share the workspace loading below.

pub mod completions;
pub mod conflicts;
pub mod fetch;
pub mod retarget;
pub mod schema;
pub mod status;

use std::process::ExitCode;

use anyhow::Result;

use git_fleet::config::{self, WorkspaceConfig};
use git_fleet::error::Error;
use git_fleet::interrupt::{CancelToken, InterruptGuard};
use git_fleet::model::BaseInfo;
use git_fleet::orchestrator::RepoTarget;
use git_fleet::suggestions;

use crate::cli::GlobalArgs;

/// A loaded workspace: its name, configuration and members.
pub struct Workspace {
    pub name: String,
    pub config: WorkspaceConfig,
    pub targets: Vec<RepoTarget>,
}

impl Workspace {
    /// Load the workspace named by `--workspace`, or the current directory.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let dir = match &global.workspace {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        if !dir.is_dir() {
            return Err(suggestions::workspace_not_found(&dir));
        }
        let config = config::load(&dir).map_err(|e| suggestions::for_error(&e))?;
        let targets = config.targets(&dir).map_err(|e| suggestions::for_error(&e))?;
        let name = dir
            .canonicalize()
            .unwrap_or_else(|_| dir.clone())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        Ok(Self {
            name,
            config,
            targets,
        })
    }
}

/// Exit status after every repository was attempted.
pub fn exit_code(any_failure: bool) -> ExitCode {
    if any_failure {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Run `work` with SIGINT turned into cancellation.
///
/// The interrupt guard is restored on every path. When an interrupt arrived
/// it is re-raised after restoring, so the process exits the way an
/// uninterrupted SIGINT would.
pub fn with_interrupt<T>(
    feedback: bool,
    work: impl FnOnce(&CancelToken) -> git_fleet::error::Result<T>,
) -> Result<T> {
    let (guard, token) = InterruptGuard::install(feedback);
    let result = work(&token);
    if guard.interrupted() {
        guard.restore_and_reraise();
        return Err(suggestions::for_error(&Error::Cancelled));
    }
    drop(guard);
    result.map_err(|e| suggestions::for_error(&e))
}

/// Whether stderr can show interactive feedback.
pub fn stderr_is_term() -> bool {
    console::Term::stderr().is_term()
}

/// Remote-tracking ref of a base, e.g. `upstream/main`.
pub fn base_ref(base: &BaseInfo) -> String {
    format!("{}/{}", base.remote, base.r#ref)
}
