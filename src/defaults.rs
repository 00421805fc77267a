//! Default values for git-fleet configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::time::Duration;

/// Name of the workspace file looked up in the workspace directory.
pub const CONFIG_FILENAME: &str = ".git-fleet.yaml";

/// How many recent base commits squash detection compares against.
///
/// Squashes older than this window are not detected.
pub const DEFAULT_COMMIT_LIMIT: usize = 200;

/// How often a running fetch checks for cancellation.
pub const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Remote name conventionally holding the source of truth.
pub const UPSTREAM_REMOTE: &str = "upstream";

/// Remote name conventionally holding the user's fork.
pub const ORIGIN_REMOTE: &str = "origin";

/// Branch names tried when a remote has no symbolic HEAD.
pub const DEFAULT_BRANCH_CANDIDATES: &[&str] = &["main", "master"];
