//! # Workspace Orchestration
//!
//! Fans per-repository work out across a rayon thread pool and joins before
//! returning, one barrier per phase:
//!
//! 1.  **Fetch** ([`fetch_all`]): optional. Fetches the share and base remotes
//!     of every repository and drops their cached remote roles.
//!
//! 2.  **Status** ([`gather_workspace_summary`]): gathers a [`RepoStatus`] for
//!     every repository and aggregates them into a [`WorkspaceSummary`].
//!
//! Results are always indexed like the input, whatever order the work
//! completes in. A failure in one repository becomes an annotation on that
//! repository's entry and never stops its siblings. Cancellation is checked
//! before each repository starts and at query boundaries inside it; once it
//! trips the phase returns [`Error::Cancelled`] after the in-flight work has
//! wound down.

use std::path::PathBuf;

use log::{info, warn};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::flags::{compute_flags, Flag};
use crate::interrupt::CancelToken;
use crate::model::{FailurePhase, RepoFailure, RepoReport, RepoStatus, WorkspaceSummary};
use crate::repository::RepositoryManager;
use crate::status::StatusRequest;

/// A member repository of the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub name: String,
    pub path: PathBuf,
}

impl RepoTarget {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Outcome of the fetch phase for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub name: String,
    pub error: Option<RepoFailure>,
}

fn failure(phase: FailurePhase, err: &Error) -> RepoFailure {
    RepoFailure {
        phase,
        message: err.to_string(),
    }
}

/// Fetch every repository concurrently.
///
/// `on_done` is called once per repository as it finishes, from worker
/// threads, for progress reporting.
pub fn fetch_all<F>(
    manager: &RepositoryManager,
    targets: &[RepoTarget],
    token: &CancelToken,
    on_done: F,
) -> Result<Vec<FetchOutcome>>
where
    F: Fn(&RepoTarget, Option<&RepoFailure>) + Sync,
{
    info!("fetching {} repositories", targets.len());
    let outcomes: Vec<FetchOutcome> = targets
        .par_iter()
        .map(|target| {
            let error = match manager.fetch_repo(&target.path, token) {
                Ok(()) => None,
                Err(e) => {
                    warn!("fetch failed for {}: {}", target.name, e);
                    Some(failure(FailurePhase::Fetch, &e))
                }
            };
            on_done(target, error.as_ref());
            FetchOutcome {
                name: target.name.clone(),
                error,
            }
        })
        .collect();

    token.check()?;
    Ok(outcomes)
}

/// Gather the status of every repository concurrently, in input order.
pub fn gather_statuses(
    manager: &RepositoryManager,
    targets: &[RepoTarget],
    request: &StatusRequest,
    token: &CancelToken,
) -> Result<Vec<RepoReport>> {
    info!("gathering status of {} repositories", targets.len());
    let reports: Vec<RepoReport> = targets
        .par_iter()
        .map(|target| {
            match manager.repo_status(&target.path, &target.name, request, token) {
                Ok(status) => RepoReport {
                    name: target.name.clone(),
                    status: Some(status),
                    error: None,
                },
                Err(e) => {
                    if !matches!(e, Error::Cancelled) {
                        warn!("status failed for {}: {}", target.name, e);
                    }
                    RepoReport {
                        name: target.name.clone(),
                        status: None,
                        error: Some(failure(FailurePhase::Status, &e)),
                    }
                }
            }
        })
        .collect();

    token.check()?;
    Ok(reports)
}

/// Gather every repository's status and aggregate the workspace summary.
pub fn gather_workspace_summary(
    manager: &RepositoryManager,
    workspace: &str,
    targets: &[RepoTarget],
    request: &StatusRequest,
    token: &CancelToken,
) -> Result<WorkspaceSummary> {
    let reports = gather_statuses(manager, targets, request, token)?;
    Ok(summarize(workspace, request, reports))
}

/// Record fetch failures on the matching reports.
///
/// A repository whose status also failed keeps its status error.
pub fn apply_fetch_failures(summary: &mut WorkspaceSummary, outcomes: Vec<FetchOutcome>) {
    for (report, outcome) in summary.repos.iter_mut().zip(outcomes) {
        debug_assert_eq!(report.name, outcome.name);
        if report.error.is_none() {
            report.error = outcome.error;
        }
    }
}

/// Aggregate reports into a summary. Pure; keeps the order of `reports`.
pub fn summarize(workspace: &str, request: &StatusRequest, reports: Vec<RepoReport>) -> WorkspaceSummary {
    let statuses: Vec<&RepoStatus> = reports.iter().filter_map(|r| r.status.as_ref()).collect();
    let flag_sets: Vec<_> = statuses
        .iter()
        .map(|s| compute_flags(s, &request.branch))
        .collect();

    let status_labels = Flag::ALL
        .into_iter()
        .filter(|flag| flag_sets.iter().any(|f| f.get(*flag)))
        .map(|flag| flag.name().to_string())
        .collect();

    WorkspaceSummary {
        workspace: workspace.to_string(),
        branch: request.branch.clone(),
        base: request.base.clone(),
        total: reports.len(),
        at_risk_count: flag_sets.iter().filter(|f| f.at_risk).count(),
        status_labels,
        last_commit: statuses.iter().filter_map(|s| s.last_commit_timestamp).max(),
        repos: reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadMode, Identity, LocalChanges, WorktreeKind};
    use crate::remotes::RemoteRoles;
    use crate::repository::{GitOperations, StatusOperations};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Every repository has a single `origin`; fetching `fail` repos errors.
    struct MockGit {
        fail: Vec<String>,
        fetched: Arc<Mutex<Vec<String>>>,
    }

    impl GitOperations for MockGit {
        fn remote_names(&self, _repo: &Path) -> Result<Vec<String>> {
            Ok(vec!["origin".to_string()])
        }

        fn push_default(&self, _repo: &Path) -> Result<Option<String>> {
            Ok(None)
        }

        fn fetch(&self, repo: &Path, _remote: &str, _token: &CancelToken) -> Result<()> {
            let name = repo.file_name().unwrap().to_string_lossy().to_string();
            self.fetched.lock().unwrap().push(name.clone());
            if self.fail.contains(&name) {
                Err(Error::GitCommand {
                    command: "fetch origin".to_string(),
                    repo: name,
                    stderr: "fatal: unable to access remote".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    /// Sleeps per repository so completion order differs from input order.
    struct MockStatus {
        delays: Vec<(String, u64)>,
        fail: Vec<String>,
    }

    impl StatusOperations for MockStatus {
        fn gather(
            &self,
            _repo: &Path,
            name: &str,
            _roles: Option<&RemoteRoles>,
            _request: &StatusRequest,
            _token: &CancelToken,
        ) -> Result<RepoStatus> {
            if let Some((_, ms)) = self.delays.iter().find(|(n, _)| n == name) {
                std::thread::sleep(Duration::from_millis(*ms));
            }
            if self.fail.iter().any(|n| n == name) {
                return Err(Error::GitCommand {
                    command: "status".to_string(),
                    repo: name.to_string(),
                    stderr: "fatal: not a git repository".to_string(),
                });
            }
            Ok(clean_status(name, 1_700_000_000 + name.len() as i64))
        }
    }

    fn clean_status(name: &str, timestamp: i64) -> RepoStatus {
        RepoStatus {
            name: name.to_string(),
            identity: Identity {
                worktree_kind: WorktreeKind::Full,
                head_mode: HeadMode::Attached {
                    branch: "feature".to_string(),
                },
                shallow: false,
            },
            local: LocalChanges::default(),
            base: None,
            share: None,
            operation: None,
            last_commit_timestamp: Some(timestamp),
        }
    }

    fn targets(names: &[&str]) -> Vec<RepoTarget> {
        names
            .iter()
            .map(|n| RepoTarget::new(*n, format!("/work/{}", n)))
            .collect()
    }

    fn manager(git_fail: &[&str], status: MockStatus) -> (RepositoryManager, Arc<Mutex<Vec<String>>>) {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let git = MockGit {
            fail: git_fail.iter().map(|s| s.to_string()).collect(),
            fetched: Arc::clone(&fetched),
        };
        (
            RepositoryManager::with_operations(Box::new(git), Box::new(status)),
            fetched,
        )
    }

    #[test]
    fn test_results_follow_input_order() {
        let status = MockStatus {
            delays: vec![("a".to_string(), 150), ("c".to_string(), 75)],
            fail: vec![],
        };
        let (manager, _) = manager(&[], status);
        let summary = gather_workspace_summary(
            &manager,
            "ws",
            &targets(&["a", "b", "c"]),
            &StatusRequest::new("feature"),
            &CancelToken::new(),
        )
        .unwrap();

        let names: Vec<&str> = summary.repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let status_names: Vec<&str> = summary
            .repos
            .iter()
            .map(|r| r.status.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(status_names, vec!["a", "b", "c"]);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_status_failure_is_isolated() {
        let status = MockStatus {
            delays: vec![],
            fail: vec!["b".to_string()],
        };
        let (manager, _) = manager(&[], status);
        let summary = gather_workspace_summary(
            &manager,
            "ws",
            &targets(&["a", "b", "c"]),
            &StatusRequest::new("feature"),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(summary.total, 3);
        assert!(summary.repos[0].error.is_none());
        assert!(summary.repos[2].error.is_none());
        let failure = summary.repos[1].error.as_ref().unwrap();
        assert_eq!(failure.phase, FailurePhase::Status);
        assert!(failure.message.contains("not a git repository"));
        assert!(summary.has_failures());
    }

    #[test]
    fn test_fetch_failure_is_isolated() {
        let status = MockStatus {
            delays: vec![],
            fail: vec![],
        };
        let (manager, fetched) = manager(&["b"], status);
        let list = targets(&["a", "b", "c"]);
        let token = CancelToken::new();

        let done = Mutex::new(Vec::new());
        let outcomes = fetch_all(&manager, &list, &token, |t, _| {
            done.lock().unwrap().push(t.name.clone())
        })
        .unwrap();
        assert_eq!(fetched.lock().unwrap().len(), 3);
        assert_eq!(done.lock().unwrap().len(), 3);

        let mut summary = gather_workspace_summary(
            &manager,
            "ws",
            &list,
            &StatusRequest::new("feature"),
            &token,
        )
        .unwrap();
        apply_fetch_failures(&mut summary, outcomes);

        assert_eq!(summary.repos.len(), 3);
        let errors: Vec<bool> = summary.repos.iter().map(|r| r.error.is_some()).collect();
        assert_eq!(errors, vec![false, true, false]);
        assert_eq!(summary.repos[1].error.as_ref().unwrap().phase, FailurePhase::Fetch);
        assert!(summary.repos[1].status.is_some());
    }

    #[test]
    fn test_cancelled_phase_returns_error() {
        let status = MockStatus {
            delays: vec![],
            fail: vec![],
        };
        let (manager, _) = manager(&[], status);
        let token = CancelToken::new();
        token.cancel();
        let err = gather_workspace_summary(
            &manager,
            "ws",
            &targets(&["a"]),
            &StatusRequest::new("feature"),
            &token,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_summarize_aggregates() {
        let request = StatusRequest::new("feature").with_base(Some("release".to_string()));
        let mut drifted = clean_status("web", 20);
        drifted.identity.head_mode = HeadMode::Attached {
            branch: "other".to_string(),
        };
        let reports = vec![
            RepoReport {
                name: "api".to_string(),
                status: Some(clean_status("api", 10)),
                error: None,
            },
            RepoReport {
                name: "web".to_string(),
                status: Some(drifted),
                error: None,
            },
            RepoReport {
                name: "broken".to_string(),
                status: None,
                error: Some(RepoFailure {
                    phase: FailurePhase::Status,
                    message: "boom".to_string(),
                }),
            },
        ];

        let summary = summarize("ws", &request, reports);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.base.as_deref(), Some("release"));
        assert_eq!(summary.last_commit, Some(20));
        assert_eq!(summary.at_risk_count, 0);
        assert_eq!(summary.status_labels, vec!["drifted", "local"]);
    }

    #[test]
    fn test_summarize_empty_workspace() {
        let summary = summarize("ws", &StatusRequest::new("feature"), Vec::new());
        assert_eq!(summary.total, 0);
        assert!(summary.status_labels.is_empty());
        assert_eq!(summary.last_commit, None);
        assert!(!summary.has_failures());
    }
}
