//! # Git Primitive Gateway
//!
//! Read-only queries against the system `git` binary. Every primitive takes a
//! repository directory and either returns parsed output or an error.
//!
//! Two kinds of outcome are kept apart:
//!
//! - [`run_git`] returns a [`GitOutput`] for any process that ran, whatever its
//!   exit status. Git uses exit codes for domain answers ("is an ancestor",
//!   "merge has conflicts"), so a non-zero exit is data, not an exception.
//!   Only a launch failure (missing binary, permission denied) is an `Err`.
//! - The typed helpers below interpret those exit codes. Where an exit status
//!   has no domain meaning they raise [`Error::GitCommand`].
//!
//! Nothing here writes refs, the index, or the working tree. The one exception
//! is [`fetch`], which only updates remote-tracking refs and is driven by the
//! orchestrator's fetch phase.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::defaults::{DEFAULT_BRANCH_CANDIDATES, FETCH_POLL_INTERVAL};
use crate::error::{Error, Result};
use crate::interrupt::CancelToken;
use crate::model::Commit;

/// Result of a git process that was launched successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// One entry of `git diff --name-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatus {
    pub status: String,
    pub path: String,
    pub old_path: Option<String>,
}

/// One entry of `git diff --numstat`. Binary files have no line counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumStat {
    pub path: String,
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
}

fn git_command(repo: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(repo)
        .env("LC_ALL", "C")
        .env("GIT_OPTIONAL_LOCKS", "0")
        .env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

fn launch_error(args: &[&str], err: std::io::Error) -> Error {
    Error::GitLaunch {
        command: args.join(" "),
        message: err.to_string(),
    }
}

/// Run git and capture its output. Fails only when git cannot be launched.
pub fn run_git(repo: &Path, args: &[&str]) -> Result<GitOutput> {
    run_git_with_input(repo, args, None)
}

/// Run git, feeding `input` on stdin when given.
pub fn run_git_with_input(repo: &Path, args: &[&str], input: Option<&str>) -> Result<GitOutput> {
    let mut cmd = git_command(repo, args);
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| launch_error(args, e))?;

    // Feed stdin from another thread so a large patch cannot deadlock against
    // a full stdout pipe.
    let writer = match (input, child.stdin.take()) {
        (Some(text), Some(mut stdin)) => {
            let data = text.to_owned();
            Some(std::thread::spawn(move || stdin.write_all(data.as_bytes())))
        }
        _ => None,
    };

    let output = child.wait_with_output().map_err(|e| launch_error(args, e))?;
    if let Some(handle) = writer {
        let _ = handle.join();
    }

    let result = GitOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(
        "git {} (in {}) -> {:?}",
        args.join(" "),
        repo.display(),
        result.code
    );
    Ok(result)
}

/// Run git and return stdout, treating any non-zero exit as a failure.
fn checked(repo: &Path, args: &[&str]) -> Result<String> {
    let out = run_git(repo, args)?;
    if out.success() {
        Ok(out.stdout)
    } else {
        Err(command_error(repo, args, &out))
    }
}

fn command_error(repo: &Path, args: &[&str], out: &GitOutput) -> Error {
    Error::GitCommand {
        command: args.join(" "),
        repo: repo.display().to_string(),
        stderr: out.stderr.trim().to_string(),
    }
}

/// Whether `path` looks like a git working tree (full or linked).
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Resolve a revision to a full commit hash; `None` when it does not resolve.
pub fn resolve_ref(repo: &Path, rev: &str) -> Result<Option<String>> {
    let commitish = format!("{}^{{commit}}", rev);
    let out = run_git(repo, &["rev-parse", "--verify", "--quiet", &commitish])?;
    if out.success() {
        Ok(Some(out.stdout.trim().to_string()))
    } else {
        Ok(None)
    }
}

/// Whether a fully-qualified ref (e.g. `refs/remotes/origin/main`) exists.
pub fn ref_exists(repo: &Path, full_ref: &str) -> Result<bool> {
    let out = run_git(repo, &["show-ref", "--verify", "--quiet", full_ref])?;
    Ok(out.success())
}

/// Commits in `range`, newest first, with short hash and subject.
pub fn list_commits(repo: &Path, range: &str) -> Result<Vec<Commit>> {
    let stdout = checked(repo, &["log", "--format=%H%x1f%h%x1f%s", range, "--"])?;
    Ok(parse_commit_lines(&stdout))
}

fn parse_commit_lines(stdout: &str) -> Vec<Commit> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\u{1f}');
            let hash = parts.next()?.trim();
            if hash.is_empty() {
                return None;
            }
            Some(Commit {
                hash: hash.to_string(),
                short_hash: parts.next().unwrap_or_default().to_string(),
                subject: parts.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Full hashes in `range`, newest first, optionally bounded to `limit`.
pub fn list_commit_hashes(repo: &Path, range: &str, limit: Option<usize>) -> Result<Vec<String>> {
    let max = limit.map(|n| format!("--max-count={}", n));
    let mut args = vec!["rev-list"];
    if let Some(m) = max.as_deref() {
        args.push(m);
    }
    args.extend([range, "--"]);
    let stdout = checked(repo, &args)?;
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// Number of commits in `range`.
pub fn count_commits(repo: &Path, range: &str) -> Result<u32> {
    let stdout = checked(repo, &["rev-list", "--count", range, "--"])?;
    Ok(stdout.trim().parse().unwrap_or(0))
}

/// Commits reachable only from `left` and only from `right`.
pub fn ahead_behind(repo: &Path, left: &str, right: &str) -> Result<(u32, u32)> {
    let range = format!("{}...{}", left, right);
    let stdout = checked(repo, &["rev-list", "--left-right", "--count", &range, "--"])?;
    Ok(parse_ahead_behind(&stdout))
}

fn parse_ahead_behind(stdout: &str) -> (u32, u32) {
    let mut parts = stdout.split_whitespace().map(|s| s.parse::<u32>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

/// Best common ancestor of `a` and `b`; `None` for unrelated histories.
pub fn merge_base(repo: &Path, a: &str, b: &str) -> Result<Option<String>> {
    let args = ["merge-base", a, b];
    let out = run_git(repo, &args)?;
    match out.code {
        Some(0) => Ok(Some(out.stdout.trim().to_string())),
        Some(1) => Ok(None),
        _ => Err(command_error(repo, &args, &out)),
    }
}

/// Whether `ancestor` is reachable from `descendant`.
pub fn is_ancestor(repo: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
    let args = ["merge-base", "--is-ancestor", ancestor, descendant];
    let out = run_git(repo, &args)?;
    match out.code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(command_error(repo, &args, &out)),
    }
}

/// Whether `commit` (a full hash) lies on the first-parent chain of `tip`,
/// i.e. it was committed to that line directly rather than merged in.
pub fn on_first_parent_chain(repo: &Path, commit: &str, tip: &str) -> Result<bool> {
    let stdout = checked(repo, &["rev-list", "--first-parent", tip, "--"])?;
    Ok(stdout.lines().any(|line| line.trim() == commit))
}

/// Paths changed between two revisions, with their status letters.
pub fn diff_name_status(repo: &Path, from: &str, to: &str) -> Result<Vec<NameStatus>> {
    let stdout = checked(repo, &["diff", "--name-status", "-z", from, to, "--"])?;
    Ok(parse_name_status(&stdout))
}

fn parse_name_status(stdout: &str) -> Vec<NameStatus> {
    let parts: Vec<&str> = stdout.split('\u{0}').collect();
    let mut entries = Vec::new();
    let mut i = 0;
    while i < parts.len() && !parts[i].is_empty() {
        let code = parts[i];
        i += 1;
        if code.starts_with('R') || code.starts_with('C') {
            if i + 1 >= parts.len() {
                break;
            }
            entries.push(NameStatus {
                status: code[..1].to_string(),
                path: parts[i + 1].to_string(),
                old_path: Some(parts[i].to_string()),
            });
            i += 2;
        } else {
            let Some(path) = parts.get(i) else { break };
            i += 1;
            if path.is_empty() {
                continue;
            }
            entries.push(NameStatus {
                status: code.to_string(),
                path: path.to_string(),
                old_path: None,
            });
        }
    }
    entries
}

/// Added/deleted line counts per path between two revisions.
pub fn diff_numstat(repo: &Path, from: &str, to: &str) -> Result<Vec<NumStat>> {
    let stdout = checked(repo, &["diff", "--numstat", "--no-renames", from, to, "--"])?;
    Ok(parse_numstat(&stdout))
}

fn parse_numstat(stdout: &str) -> Vec<NumStat> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let additions = parts.next()?.parse().ok();
            let deletions = parts.next()?.parse().ok();
            let path = parts.next()?.to_string();
            Some(NumStat {
                path,
                additions,
                deletions,
            })
        })
        .collect()
}

/// Patch text of a single commit against its first parent.
pub fn commit_patch(repo: &Path, hash: &str) -> Result<String> {
    checked(
        repo,
        &["show", "--format=", "--no-color", "--no-ext-diff", "-p", hash, "--"],
    )
}

/// Cumulative patch text between two revisions.
pub fn range_patch(repo: &Path, from: &str, to: &str) -> Result<String> {
    checked(repo, &["diff", "--no-color", "--no-ext-diff", from, to, "--"])
}

/// Stable content id of a patch, or `None` for an empty patch.
pub fn patch_id(repo: &Path, patch: &str) -> Result<Option<String>> {
    if patch.trim().is_empty() {
        return Ok(None);
    }
    let args = ["patch-id", "--stable"];
    let out = run_git_with_input(repo, &args, Some(patch))?;
    if !out.success() {
        return Err(command_error(repo, &args, &out));
    }
    Ok(out.stdout.split_whitespace().next().map(String::from))
}

/// Simulate a three-way merge of `theirs` into `ours` without touching the
/// working tree or index. Exit 0 is clean, exit 1 lists conflicted paths.
pub fn merge_tree(
    repo: &Path,
    ours: &str,
    theirs: &str,
    merge_base: Option<&str>,
) -> Result<GitOutput> {
    let base_arg = merge_base.map(|b| format!("--merge-base={}", b));
    let mut args = vec!["merge-tree", "--write-tree", "--name-only", "--no-messages"];
    if let Some(b) = base_arg.as_deref() {
        args.push(b);
    }
    args.extend([ours, theirs]);
    run_git(repo, &args)
}

/// Names of the configured remotes.
pub fn remote_names(repo: &Path) -> Result<Vec<String>> {
    let stdout = checked(repo, &["remote"])?;
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// Fetch URL of a remote.
pub fn remote_url(repo: &Path, remote: &str) -> Result<Option<String>> {
    let out = run_git(repo, &["remote", "get-url", remote])?;
    Ok(out
        .success()
        .then(|| out.stdout.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Value of a config key; `None` when unset.
pub fn config_get(repo: &Path, key: &str) -> Result<Option<String>> {
    let args = ["config", "--get", key];
    let out = run_git(repo, &args)?;
    match out.code {
        Some(0) => Ok(Some(out.stdout.trim().to_string())),
        Some(1) => Ok(None),
        _ => Err(command_error(repo, &args, &out)),
    }
}

/// Short name of the branch HEAD points to; `None` when detached.
pub fn symbolic_head(repo: &Path) -> Result<Option<String>> {
    let args = ["symbolic-ref", "--quiet", "--short", "HEAD"];
    let out = run_git(repo, &args)?;
    match out.code {
        Some(0) => Ok(Some(out.stdout.trim().to_string())),
        Some(1) => Ok(None),
        _ => Err(command_error(repo, &args, &out)),
    }
}

/// Default branch of a remote, from its symbolic HEAD or well-known names.
pub fn remote_default_branch(repo: &Path, remote: &str) -> Result<Option<String>> {
    let head_ref = format!("refs/remotes/{}/HEAD", remote);
    let out = run_git(repo, &["symbolic-ref", "--quiet", "--short", &head_ref])?;
    if out.success() {
        let prefix = format!("{}/", remote);
        let name = out.stdout.trim();
        return Ok(Some(name.strip_prefix(&prefix).unwrap_or(name).to_string()));
    }
    for candidate in DEFAULT_BRANCH_CANDIDATES {
        if ref_exists(repo, &format!("refs/remotes/{}/{}", remote, candidate))? {
            return Ok(Some(candidate.to_string()));
        }
    }
    Ok(None)
}

/// `git status --porcelain=v1 -z` output.
pub fn status_porcelain(repo: &Path) -> Result<String> {
    checked(
        repo,
        &["status", "--porcelain=v1", "-z", "--untracked-files=normal"],
    )
}

/// Absolute path of the repository's git directory.
pub fn absolute_git_dir(repo: &Path) -> Result<PathBuf> {
    let stdout = checked(repo, &["rev-parse", "--absolute-git-dir"])?;
    Ok(PathBuf::from(stdout.trim()))
}

pub fn is_shallow(repo: &Path) -> Result<bool> {
    let stdout = checked(repo, &["rev-parse", "--is-shallow-repository"])?;
    Ok(stdout.trim() == "true")
}

/// Committer timestamp of HEAD; `None` on an unborn branch.
pub fn last_commit_timestamp(repo: &Path) -> Result<Option<i64>> {
    if resolve_ref(repo, "HEAD")?.is_none() {
        return Ok(None);
    }
    let stdout = checked(repo, &["log", "-1", "--format=%ct", "HEAD", "--"])?;
    Ok(stdout.trim().parse().ok())
}

/// Fetch one remote, killing the child process if `token` trips.
pub fn fetch(repo: &Path, remote: &str, token: &CancelToken) -> Result<GitOutput> {
    let args = ["fetch", "--prune", "--quiet", remote];
    let mut child = git_command(repo, &args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(&args, e))?;

    // Drain stderr while polling so a chatty fetch cannot fill the pipe and stall.
    let reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            pipe.read_to_string(&mut buf).map(|_| buf)
        })
    });

    let status = loop {
        if token.is_cancelled() {
            debug!("cancelling fetch of {} in {}", remote, repo.display());
            let _ = child.kill();
            let _ = child.wait();
            if let Some(reader) = reader {
                let _ = reader.join();
            }
            return Err(Error::Cancelled);
        }
        match child.try_wait()? {
            Some(status) => break status,
            None => std::thread::sleep(FETCH_POLL_INTERVAL),
        }
    };

    let stderr = match reader {
        Some(reader) => reader.join().map_err(|_| {
            Error::Io(std::io::Error::other("stderr reader thread panicked"))
        })??,
        None => String::new(),
    };
    debug!(
        "git fetch {} (in {}) -> {:?}",
        remote,
        repo.display(),
        status.code()
    );
    Ok(GitOutput {
        code: status.code(),
        stdout: String::new(),
        stderr,
    })
}
