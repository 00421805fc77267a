//! # git-fleet Library
//!
//! This library treats a set of independently versioned git repositories as
//! one workspace tracking a single feature branch. For every member it answers
//! whether the repository is dirty, diverged, merged, rebased, or safe to push,
//! rebase or retarget, without ever modifying it.
//!
//! ## Quick Example
//!
//! ```
//! use git_fleet::filter::FilterExpr;
//! use git_fleet::flags::RepoFlags;
//!
//! let expr = FilterExpr::parse("dirty+unpushed,^detached").unwrap();
//!
//! let flags = RepoFlags {
//!     dirty: true,
//!     unpushed: true,
//!     detached: true,
//!     ..Default::default()
//! };
//! assert!(expr.matches(&flags));
//!
//! // Unknown flags are rejected up front.
//! assert!(FilterExpr::parse("dirty,unpushd").is_err());
//! ```
//!
//! ## Core Concepts
//!
//! - **Gateway (`git`)**: read-only queries against the `git` binary. A
//!   non-zero exit is a result, not an error; only launch failures are errors.
//!
//! - **Correlation (`correlation`)**: patch-id fingerprints that survive
//!   rebases and squashes, used to detect merges and match rewritten commits.
//!
//! - **Conflict prediction (`conflict`)**: simulated merges that never touch
//!   the working tree or index.
//!
//! - **Remote roles (`remotes`, `cache`)**: which remote is pushed to and which
//!   is the source of truth, memoized per command.
//!
//! - **Status (`status`, `flags`, `filter`)**: the per-repository model, the
//!   flags derived from it and the `--where` filter language.
//!
//! - **Orchestration (`orchestrator`, `interrupt`)**: concurrent, order
//!   preserving fan-out with per-repository failure isolation and
//!   cancellation.

pub mod cache;
pub mod config;
pub mod conflict;
pub mod correlation;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod flags;
pub mod git;
pub mod interrupt;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod remotes;
pub mod repository;
pub mod schema;
pub mod status;
pub mod suggestions;

#[cfg(test)]
mod filter_proptest;
#[cfg(test)]
mod test_support;
