// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use std::cell::Cell;
use std::time::{Duration, Instant};

use common::{branching_rule, build, growth_rule, never};
use setreplace_core::{SetError, StepSpecification, TerminationReason};

#[test]
fn abort_before_any_event_changes_nothing() {
    let mut set = build(vec![growth_rule()], vec![vec![1, 2]]);
    let digest = set.history_digest();
    let res = set.replace(StepSpecification::default(), || true);
    assert_eq!(res, Err(SetError::Aborted));
    assert!(set.events().is_empty());
    assert_eq!(set.history_digest(), digest);
    assert_eq!(set.termination_reason(), TerminationReason::Aborted);
}

#[test]
fn abort_mid_run_keeps_committed_events() {
    let mut set = build(vec![growth_rule()], vec![vec![1, 2]]);
    let polls = Cell::new(0u32);
    let res = set.replace(StepSpecification::default(), || {
        polls.set(polls.get() + 1);
        polls.get() > 25
    });
    assert_eq!(res, Err(SetError::Aborted));

    let committed = set.events().len();
    assert!(committed > 0, "some events landed before the abort");
    for event in set.events() {
        for id in &event.inputs {
            assert_eq!(set.expressions()[id.index()].destroyer, Some(event.id));
        }
    }
}

#[test]
fn resumed_run_matches_uninterrupted_run() {
    let total = 12usize;

    let mut straight = build(vec![branching_rule()], vec![vec![1, 1], vec![1, 1]]);
    straight
        .replace(StepSpecification::default().with_max_events(total), never)
        .expect("uninterrupted replace succeeds");

    let mut resumed = build(vec![branching_rule()], vec![vec![1, 1], vec![1, 1]]);
    let polls = Cell::new(0u32);
    let first = resumed.replace(StepSpecification::default().with_max_events(total), || {
        polls.set(polls.get() + 1);
        polls.get() > 9
    });
    assert_eq!(first, Err(SetError::Aborted));
    let done = resumed.events().len();
    assert!(done < total, "abort must land before the budget is spent");

    let rest = resumed
        .replace(
            StepSpecification::default().with_max_events(total - done),
            never,
        )
        .expect("resumed replace succeeds");
    assert_eq!(done + rest, total);
    assert_eq!(resumed.history_digest(), straight.history_digest());
    assert_eq!(resumed.expressions(), straight.expressions());
}

#[test]
fn replace_once_honors_abort() {
    let mut set = build(vec![growth_rule()], vec![vec![1, 2]]);
    assert_eq!(set.replace_once(|| true), Err(SetError::Aborted));
    assert!(set.events().is_empty());
    assert_eq!(set.replace_once(never), Ok(1));
}

#[test]
fn deadline_predicate_bounds_an_unbounded_run() {
    common::init_tracing();
    let deadline = Instant::now() + Duration::from_millis(50);
    let mut set = build(vec![growth_rule()], vec![vec![1, 2]]);
    let res = set.replace(StepSpecification::default(), || Instant::now() >= deadline);
    assert_eq!(res, Err(SetError::Aborted));
    assert!(!set.events().is_empty());
}
