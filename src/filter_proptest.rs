//! Property-based tests for the filter language and derived flags.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::filter::FilterExpr;
    use crate::flags::{compute_flags, Flag, RepoFlags};
    use crate::model::{
        BaseInfo, ConflictVerdict, HeadMode, Identity, LocalChanges, MergeKind, OperationKind,
        RepoStatus, RetargetReplay, ShareInfo, ShareRefMode, WorktreeKind,
    };
    use proptest::prelude::*;

    fn any_flag() -> impl Strategy<Value = Flag> {
        (0..Flag::ALL.len()).prop_map(|i| Flag::ALL[i])
    }

    fn any_flags() -> impl Strategy<Value = RepoFlags> {
        prop::collection::vec(any::<bool>(), Flag::ALL.len()).prop_map(|bits| RepoFlags {
            dirty: bits[0],
            unpushed: bits[1],
            behind_share: bits[2],
            behind_base: bits[3],
            diverged: bits[4],
            drifted: bits[5],
            detached: bits[6],
            operation: bits[7],
            local: bits[8],
            gone: bits[9],
            shallow: bits[10],
            merged: bits[11],
            base_merged: bits[12],
            base_missing: bits[13],
            at_risk: bits[14],
        })
    }

    /// A filter as nested term lists: OR of AND of (flag, negated).
    fn any_terms() -> impl Strategy<Value = Vec<Vec<(Flag, bool)>>> {
        prop::collection::vec(
            prop::collection::vec((any_flag(), any::<bool>()), 1..4),
            1..4,
        )
    }

    fn render(terms: &[Vec<(Flag, bool)>]) -> String {
        terms
            .iter()
            .map(|and| {
                and.iter()
                    .map(|(f, neg)| format!("{}{}", if *neg { "^" } else { "" }, f.name()))
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn any_merge() -> impl Strategy<Value = Option<MergeKind>> {
        prop_oneof![
            Just(None),
            Just(Some(MergeKind::Merge)),
            Just(Some(MergeKind::Squash))
        ]
    }

    fn any_base() -> impl Strategy<Value = Option<BaseInfo>> {
        prop::option::of(
            (
                0u32..5,
                0u32..5,
                any::<bool>(),
                any_merge(),
                any_merge(),
                0usize..4,
            )
                .prop_map(|(ahead, behind, fallen, merged, base_merged, verdict)| BaseInfo {
                    remote: "upstream".to_string(),
                    r#ref: "main".to_string(),
                    configured_ref: fallen.then(|| "release".to_string()),
                    ahead,
                    behind,
                    merged_into_base: merged,
                    base_merged_into_default: base_merged,
                    conflict: [
                        ConflictVerdict::NotChecked,
                        ConflictVerdict::Clean,
                        ConflictVerdict::Conflict,
                        ConflictVerdict::Unknown,
                    ][verdict],
                }),
        )
    }

    fn any_share() -> impl Strategy<Value = Option<ShareInfo>> {
        prop::option::of(
            (
                0usize..4,
                prop::option::of(0u32..5),
                prop::option::of(0u32..5),
                prop::option::of(0u32..5),
            )
                .prop_map(|(mode, to_push, to_pull, superseded)| ShareInfo {
                    remote: "origin".to_string(),
                    r#ref: Some("feature".to_string()),
                    ref_mode: [
                        ShareRefMode::NoRef,
                        ShareRefMode::Implicit,
                        ShareRefMode::Configured,
                        ShareRefMode::Gone,
                    ][mode],
                    to_push,
                    to_pull,
                    rebased: superseded,
                    superseded,
                }),
        )
    }

    fn any_status() -> impl Strategy<Value = RepoStatus> {
        (
            prop::option::of("[a-z]{1,8}"),
            any::<bool>(),
            (0u32..3, 0u32..3, 0u32..3, 0u32..3),
            any_base(),
            any_share(),
            any::<bool>(),
        )
            .prop_map(|(branch, shallow, (staged, modified, untracked, conflicts), base, share, op)| {
                RepoStatus {
                    name: "repo".to_string(),
                    identity: Identity {
                        worktree_kind: WorktreeKind::Full,
                        head_mode: match branch {
                            Some(branch) => HeadMode::Attached { branch },
                            None => HeadMode::Detached,
                        },
                        shallow,
                    },
                    local: LocalChanges {
                        staged,
                        modified,
                        untracked,
                        conflicts,
                    },
                    base,
                    share,
                    operation: op.then_some(OperationKind::Rebase),
                    last_commit_timestamp: None,
                }
            })
    }

    proptest! {
        /// Property: the parser agrees with direct OR-of-AND evaluation
        #[test]
        fn filter_matches_reference_semantics(terms in any_terms(), flags in any_flags()) {
            let expr = FilterExpr::parse(&render(&terms)).unwrap();
            let expected = terms
                .iter()
                .any(|and| and.iter().all(|(f, neg)| flags.get(*f) != *neg));
            prop_assert_eq!(expr.matches(&flags), expected);
        }

        /// Property: Display output parses back to the same expression
        #[test]
        fn filter_display_round_trips(terms in any_terms()) {
            let expr = FilterExpr::parse(&render(&terms)).unwrap();
            let reparsed = FilterExpr::parse(&expr.to_string()).unwrap();
            prop_assert_eq!(expr, reparsed);
        }

        /// Property: names that are not flags never parse
        #[test]
        fn unknown_flag_names_are_rejected(name in "[a-z]{1,12}") {
            prop_assume!(Flag::from_name(&name).is_none());
            prop_assert!(FilterExpr::parse(&name).is_err());
            let negated = format!("^{}", name);
            prop_assert!(FilterExpr::parse(&negated).is_err());
        }

        /// Property: compute_flags is total and internally consistent
        #[test]
        fn compute_flags_is_total(status in any_status(), expected in "[a-z]{1,8}") {
            let flags = compute_flags(&status, &expected);
            prop_assert_eq!(flags.local, status.base.is_none() && status.share.is_none());
            prop_assert_eq!(flags.detached, status.identity.head_mode.branch().is_none());
            prop_assert!(!(flags.detached && flags.drifted));
            if flags.diverged {
                prop_assert!(flags.behind_base);
            }
            if flags.base_merged {
                prop_assert!(flags.at_risk);
            }
            prop_assert_eq!(flags.dirty, status.local.is_dirty());
        }

        /// Property: a retarget never replays more than it has, nor less than zero
        #[test]
        fn retarget_replay_arithmetic(total in 0u32..1000, already in 0u32..1000) {
            let replay = RetargetReplay::new(total, already);
            prop_assert_eq!(replay.to_replay + replay.already_on_target, replay.total_local);
            prop_assert!(replay.already_on_target <= total);
        }
    }
}
