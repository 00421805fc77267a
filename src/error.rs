//! # Error Handling
//!
//! This module defines the centralized error type for `git-fleet`. It uses the
//! `thiserror` library to build an `Error` enum covering every failure the
//! reconciliation engine can surface, each carrying enough context for an
//! actionable message.
//!
//! ## Taxonomy
//!
//! Not every unusual outcome is an error. The engine distinguishes:
//!
//! - **Launch failures** (`GitLaunch`): git could not be started at all. A git
//!   process that runs and exits non-zero is *not* an error at the gateway
//!   boundary; exit codes carry domain meaning (e.g. "conflict predicted").
//! - **Ambiguity errors** (`AmbiguousRemotes`): remote roles cannot be
//!   determined. Always surfaced verbatim, never defaulted.
//! - **Validation errors** (`InvalidFilter`, `Config`): rejected before any
//!   repository I/O happens.
//! - **Per-repository failures**: any of the above raised while querying one
//!   repository. The orchestrator records these as annotations on that
//!   repository's report instead of aborting its siblings.
//!
//! Fallback conditions (a configured base ref that no longer resolves) and
//! indeterminate conflict predictions are modelled as data, not as errors.

use thiserror::Error;

/// Main error type for git-fleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// The git binary could not be launched (missing binary, permission denied).
    #[error("Failed to launch git {command}: {message}")]
    GitLaunch { command: String, message: String },

    /// A git query exited non-zero where no exit status carries domain meaning.
    #[error("Git command failed in {repo}: git {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// Remote roles could not be determined from the configured remotes.
    #[error("{message} (remotes: {})", remotes.join(", "))]
    AmbiguousRemotes {
        message: String,
        remotes: Vec<String>,
    },

    /// A `--where` filter expression failed validation.
    #[error("Invalid filter term '{term}': {message}")]
    InvalidFilter { term: String, message: String },

    /// The workspace configuration is missing or malformed.
    #[error("Workspace configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A workspace member directory does not exist or is not a git repository.
    #[error("Repository not found: {path}")]
    RepoNotFound { path: String },

    /// The operation was interrupted before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is an ambiguity that must be surfaced verbatim.
    pub fn is_ambiguity(&self) -> bool {
        matches!(self, Error::AmbiguousRemotes { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_git_launch() {
        let error = Error::GitLaunch {
            command: "status".to_string(),
            message: "No such file or directory".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Failed to launch git status"));
        assert!(display.contains("No such file or directory"));
    }

    #[test]
    fn test_error_display_git_command() {
        let error = Error::GitCommand {
            command: "rev-list --count HEAD".to_string(),
            repo: "/work/api".to_string(),
            stderr: "fatal: bad revision".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("/work/api"));
        assert!(display.contains("rev-list --count HEAD"));
        assert!(display.contains("bad revision"));
    }

    #[test]
    fn test_error_display_ambiguous_remotes_names_remotes() {
        let error = Error::AmbiguousRemotes {
            message: "cannot determine remote roles".to_string(),
            remotes: vec!["fork".to_string(), "staging".to_string()],
        };
        let display = format!("{}", error);
        assert!(display.contains("cannot determine remote roles"));
        assert!(display.contains("fork, staging"));
        assert!(error.is_ambiguity());
    }

    #[test]
    fn test_error_display_invalid_filter() {
        let error = Error::InvalidFilter {
            term: "dirtyy".to_string(),
            message: "unknown flag".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'dirtyy'"));
        assert!(display.contains("unknown flag"));
        assert!(!error.is_ambiguity());
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "missing branch".to_string(),
            hint: Some("Add 'branch:' to .git-fleet.yaml".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Workspace configuration error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("branch:"));
    }

    #[test]
    fn test_error_display_config_without_hint() {
        let error = Error::Config {
            message: "missing branch".to_string(),
            hint: None,
        };
        assert!(!format!("{}", error).contains("hint:"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
