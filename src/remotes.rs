//! # Remote Role Resolution
//!
//! Decides which configured remote receives the user's pushes (the *share*
//! remote) and which one is the source of truth (the *base* remote).
//!
//! Resolution is a pure function of the remote names and the optional
//! `remote.pushDefault` value. The first matching rule wins:
//!
//! 1. Exactly one remote: it is both share and base.
//! 2. A push default is set: it is the share remote. The base is a remote
//!    named `upstream` if present, otherwise the only other remote. Anything
//!    else is an ambiguity error.
//! 3. No push default and both `origin` and `upstream` exist: `origin` shares,
//!    `upstream` is the base.
//! 4. Otherwise the roles are ambiguous.
//!
//! Ambiguity is always an error naming the remotes involved; roles are never
//! guessed. A repository with no remotes at all has no roles.

use crate::defaults::{ORIGIN_REMOTE, UPSTREAM_REMOTE};
use crate::error::{Error, Result};

/// Resolved share/base remotes of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRoles {
    pub share: String,
    pub base: String,
}

impl RemoteRoles {
    /// The remotes to contact, without repeating a remote that plays both roles.
    pub fn distinct(&self) -> Vec<&str> {
        if self.share == self.base {
            vec![self.share.as_str()]
        } else {
            vec![self.share.as_str(), self.base.as_str()]
        }
    }
}

fn ambiguous(message: &str, remotes: &[String]) -> Error {
    let mut names = remotes.to_vec();
    names.sort();
    Error::AmbiguousRemotes {
        message: message.to_string(),
        remotes: names,
    }
}

/// Resolve remote roles from the configured remote names.
///
/// Returns `Ok(None)` when no remotes are configured.
pub fn resolve_remote_roles(
    remotes: &[String],
    push_default: Option<&str>,
) -> Result<Option<RemoteRoles>> {
    let has = |name: &str| remotes.iter().any(|r| r == name);

    match remotes {
        [] => return Ok(None),
        [only] => {
            return Ok(Some(RemoteRoles {
                share: only.clone(),
                base: only.clone(),
            }))
        }
        _ => {}
    }

    if let Some(share) = push_default.filter(|p| !p.is_empty()) {
        if !has(share) {
            return Err(ambiguous(
                &format!("push default remote '{}' is not configured", share),
                remotes,
            ));
        }
        let base = if has(UPSTREAM_REMOTE) {
            UPSTREAM_REMOTE.to_string()
        } else {
            let others: Vec<&String> = remotes.iter().filter(|r| *r != share).collect();
            match others.as_slice() {
                [other] => (*other).clone(),
                _ => return Err(ambiguous("cannot determine upstream remote", remotes)),
            }
        };
        return Ok(Some(RemoteRoles {
            share: share.to_string(),
            base,
        }));
    }

    if has(ORIGIN_REMOTE) && has(UPSTREAM_REMOTE) {
        return Ok(Some(RemoteRoles {
            share: ORIGIN_REMOTE.to_string(),
            base: UPSTREAM_REMOTE.to_string(),
        }));
    }

    Err(ambiguous("cannot determine remote roles", remotes))
}
