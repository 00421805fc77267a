//! # Output Configuration and Rendering
//!
//! This module provides utilities for controlling CLI output appearance and
//! renders the status model as text. Rendering only reads the model; it never
//! computes status itself.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;
use std::fmt::Write as _;

use console::Style;

use crate::flags::{compute_flags, Flag};
use crate::model::{
    BaseInfo, ConflictVerdict, HeadMode, RepoReport, RepoStatus, ShareInfo, ShareRefMode,
    WorkspaceSummary,
};

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Apply `style` when colors are enabled.
    pub fn paint(&self, text: &str, style: &Style) -> String {
        if self.use_color {
            style.apply_to(text).force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

fn flag_style(flag: Flag) -> Style {
    match flag {
        Flag::AtRisk | Flag::Gone | Flag::BaseMissing | Flag::Operation => Style::new().red(),
        Flag::Dirty | Flag::Unpushed | Flag::Diverged | Flag::Drifted | Flag::BaseMerged => {
            Style::new().yellow()
        }
        Flag::Merged => Style::new().green(),
        _ => Style::new().dim(),
    }
}

fn describe_head(status: &RepoStatus) -> String {
    match &status.identity.head_mode {
        HeadMode::Attached { branch } => branch.clone(),
        HeadMode::Detached => "(detached)".to_string(),
    }
}

fn describe_base(base: &BaseInfo) -> String {
    let mut text = format!("{}/{} +{} -{}", base.remote, base.r#ref, base.ahead, base.behind);
    if let Some(configured) = &base.configured_ref {
        let _ = write!(text, " (configured '{}')", configured);
    }
    match base.conflict {
        ConflictVerdict::Conflict => text.push_str(" conflict"),
        ConflictVerdict::Unknown => text.push_str(" conflict?"),
        ConflictVerdict::Clean | ConflictVerdict::NotChecked => {}
    }
    text
}

fn describe_share(share: &ShareInfo) -> String {
    let name = share.r#ref.as_deref().unwrap_or("-");
    match share.ref_mode {
        ShareRefMode::NoRef => format!("{}: not pushed", share.remote),
        ShareRefMode::Gone => format!("{}/{} gone", share.remote, name),
        ShareRefMode::Configured | ShareRefMode::Implicit => {
            let mut text = format!(
                "{}/{} +{} -{}",
                share.remote,
                name,
                share.to_push.unwrap_or(0),
                share.effective_to_pull()
            );
            if let Some(rebased) = share.rebased.filter(|n| *n > 0) {
                let _ = write!(text, " ({} rebased)", rebased);
            }
            text
        }
    }
}

/// One line describing a repository report.
pub fn render_report(report: &RepoReport, branch: &str, config: &OutputConfig) -> String {
    let name = config.paint(&report.name, &Style::new().bold());
    let mut line = match &report.status {
        Some(status) => {
            let mut parts = vec![describe_head(status)];
            if let Some(base) = &status.base {
                parts.push(format!("base {}", describe_base(base)));
            }
            if let Some(share) = &status.share {
                parts.push(format!("share {}", describe_share(share)));
            }
            let flags: Vec<String> = compute_flags(status, branch)
                .set_flags()
                .into_iter()
                .map(|f| config.paint(f.name(), &flag_style(f)))
                .collect();
            if !flags.is_empty() {
                parts.push(format!("[{}]", flags.join(", ")));
            }
            format!("{}  {}", name, parts.join("  "))
        }
        None => name,
    };
    if let Some(error) = &report.error {
        let phase = match error.phase {
            crate::model::FailurePhase::Fetch => "fetch",
            crate::model::FailurePhase::Status => "status",
        };
        let message = format!("{} failed: {}", phase, error.message);
        let _ = write!(line, "  {}", config.paint(&message, &Style::new().red()));
    }
    line
}

/// Text rendering of a workspace summary for the reports in `visible`.
pub fn render_summary(
    summary: &WorkspaceSummary,
    visible: &[&RepoReport],
    config: &OutputConfig,
) -> String {
    let mut out = String::new();
    let base = summary.base.as_deref().unwrap_or("(remote default)");
    let _ = writeln!(
        out,
        "{} on {} (base {})",
        config.paint(&summary.workspace, &Style::new().bold()),
        summary.branch,
        base
    );
    for report in visible {
        let _ = writeln!(out, "{}", render_report(report, &summary.branch, config));
    }
    let _ = write!(
        out,
        "{} of {} repositories shown, {} at risk",
        visible.len(),
        summary.total,
        summary.at_risk_count
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FailurePhase, Identity, LocalChanges, RepoFailure, WorktreeKind,
    };

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_paint_respects_config() {
        let style = Style::new().red();
        assert_eq!(OutputConfig::without_color().paint("x", &style), "x");
        assert_ne!(OutputConfig::with_color().paint("x", &style), "x");
    }

    fn status() -> RepoStatus {
        RepoStatus {
            name: "api".to_string(),
            identity: Identity {
                worktree_kind: WorktreeKind::Full,
                head_mode: HeadMode::Attached {
                    branch: "feature".to_string(),
                },
                shallow: false,
            },
            local: LocalChanges {
                modified: 1,
                ..Default::default()
            },
            base: Some(BaseInfo {
                remote: "upstream".to_string(),
                r#ref: "main".to_string(),
                configured_ref: None,
                ahead: 2,
                behind: 1,
                merged_into_base: None,
                base_merged_into_default: None,
                conflict: ConflictVerdict::Conflict,
            }),
            share: Some(ShareInfo {
                remote: "origin".to_string(),
                r#ref: Some("feature".to_string()),
                ref_mode: ShareRefMode::Configured,
                to_push: Some(2),
                to_pull: Some(0),
                rebased: Some(0),
                superseded: Some(0),
            }),
            operation: None,
            last_commit_timestamp: Some(1),
        }
    }

    #[test]
    fn test_render_report_plain() {
        let report = RepoReport {
            name: "api".to_string(),
            status: Some(status()),
            error: None,
        };
        let line = render_report(&report, "feature", &OutputConfig::without_color());
        insta::assert_snapshot!(line, @"api  feature  base upstream/main +2 -1 conflict  share origin/feature +2 -0  [dirty, unpushed, behind-base, diverged, at-risk]");
    }

    #[test]
    fn test_render_failed_report() {
        let report = RepoReport {
            name: "web".to_string(),
            status: None,
            error: Some(RepoFailure {
                phase: FailurePhase::Fetch,
                message: "network down".to_string(),
            }),
        };
        let line = render_report(&report, "feature", &OutputConfig::without_color());
        assert_eq!(line, "web  fetch failed: network down");
    }
}
