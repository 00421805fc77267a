//! Shared test utilities for integration and E2E tests.
//!
//! This module builds throwaway workspaces of real git repositories. Every
//! member is a clone of its own bare repository, which plays the part of the
//! remote.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = WorkspaceFixture::new().with_config(configs::FEATURE);
//!     let api = fixture.add_member("api");
//!     api.start_feature("feature");
//!     // ... test code
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::{git, Member, WorkspaceFixture};
}

/// Workspace configuration snippets.
#[allow(dead_code)]
pub mod configs {
    /// Track `feature` against the remote's default branch.
    pub const FEATURE: &str = "branch: feature\n";

    /// Track `feature` against a base branch that does not exist.
    pub const MISSING_BASE: &str = "branch: feature\nbase: release/9.9\n";

    /// Track `feature` against a `release` base branch.
    pub const RELEASE_BASE: &str = "branch: feature\nbase: release\n";

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "branch: [unclosed";
}

/// Run git in `dir` and return trimmed stdout, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C")
        .output()
        .expect("failed to launch git");
    assert!(
        out.status.success(),
        "git {:?} in {} failed: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "Fleet Test"]);
    git(dir, &["config", "user.email", "fleet@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// A temporary directory holding `ws/` (the workspace) and `remotes/`.
pub struct WorkspaceFixture {
    temp_dir: assert_fs::TempDir,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir.child("ws").create_dir_all().expect("Failed to create workspace");
        temp_dir
            .child("remotes")
            .create_dir_all()
            .expect("Failed to create remotes directory");
        Self { temp_dir }
    }

    /// Write `.git-fleet.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("ws/.git-fleet.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// The workspace directory.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("ws")
    }

    fn remote_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join("remotes").join(format!("{}.git", name))
    }

    /// Create a bare remote with one commit on `main` and clone it into the
    /// workspace as `name`. The clone is left on `main`.
    pub fn add_member(&self, name: &str) -> Member {
        let remote = self.remote_path(name);
        let seed = self.temp_dir.path().join("seeds").join(name);
        std::fs::create_dir_all(&seed).expect("Failed to create seed directory");

        git(self.temp_dir.path(), &["init", "-q", "--bare", "-b", "main", &remote.to_string_lossy()]);
        git(&seed, &["init", "-q", "-b", "main"]);
        configure_identity(&seed);
        std::fs::write(seed.join("README.md"), format!("# {}\n", name)).expect("write README");
        git(&seed, &["add", "README.md"]);
        git(&seed, &["commit", "-q", "-m", "initial"]);
        git(&seed, &["push", "-q", &remote.to_string_lossy(), "main"]);

        let path = self.path().join(name);
        self.clone_into(&remote, &path);
        Member { path, remote }
    }

    /// A second clone of `member`'s remote, for pushing as someone else.
    pub fn teammate(&self, member: &Member, label: &str) -> Member {
        let path = self.temp_dir.path().join("teammates").join(label);
        self.clone_into(&member.remote, &path);
        Member {
            path,
            remote: member.remote.clone(),
        }
    }

    fn clone_into(&self, remote: &Path, path: &Path) {
        git(
            self.temp_dir.path(),
            &["clone", "-q", &remote.to_string_lossy(), &path.to_string_lossy()],
        );
        configure_identity(path);
    }

    /// Create a command configured to run in the workspace directory.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-fleet");
        cmd.current_dir(self.path())
            .env_remove("GIT_FLEET_WORKSPACE")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One clone and the bare repository it was cloned from (`origin`).
pub struct Member {
    pub path: PathBuf,
    pub remote: PathBuf,
}

#[allow(dead_code)]
impl Member {
    pub fn git(&self, args: &[&str]) -> String {
        git(&self.path, args)
    }

    pub fn write(&self, file: &str, content: &str) {
        std::fs::write(self.path.join(file), content).expect("Failed to write file");
    }

    /// Commit `content` to `file` and return the new HEAD.
    pub fn commit(&self, file: &str, content: &str, message: &str) -> String {
        self.write(file, content);
        self.git(&["add", file]);
        self.git(&["commit", "-q", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Create and switch to `branch` from the current HEAD.
    pub fn start_feature(&self, branch: &str) {
        self.git(&["checkout", "-q", "-b", branch]);
    }

    /// Push the current branch to origin and set it as upstream.
    pub fn push_upstream(&self) {
        self.git(&["push", "-q", "-u", "origin", "HEAD"]);
    }

    pub fn fetch(&self) {
        self.git(&["fetch", "-q", "--prune", "origin"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_clone_tracks_remote() {
        let fixture = WorkspaceFixture::new();
        let api = fixture.add_member("api");
        assert!(api.path.join(".git").exists());
        assert_eq!(api.git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
        assert!(!api.git(&["rev-parse", "origin/main"]).is_empty());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [configs::FEATURE, configs::MISSING_BASE] {
            serde_yaml::from_str::<serde_yaml::Value>(config).expect("Config should be valid YAML");
        }
        assert!(serde_yaml::from_str::<serde_yaml::Value>(configs::INVALID_YAML).is_err());
    }
}
