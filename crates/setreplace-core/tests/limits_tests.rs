// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use common::{branching_rule, build, distinct_live_atoms, growth_rule, live_atoms, never};
use setreplace_core::{Rule, StepSpecification, TerminationReason};

fn self_loops() -> Vec<Vec<i64>> {
    vec![vec![1, 1], vec![1, 1]]
}

#[test]
fn max_events_caps_the_count() {
    let mut set = build(vec![branching_rule()], self_loops());
    let applied = set
        .replace(StepSpecification::default().with_max_events(7), never)
        .expect("replace succeeds");
    assert_eq!(applied, 7);
    assert_eq!(set.events().len(), 7);
    assert_eq!(set.termination_reason(), TerminationReason::MaxEvents);
}

#[test]
fn max_final_expressions_refuses_the_overflowing_event() {
    // Each event consumes two expressions and produces four.
    let mut set = build(vec![branching_rule()], self_loops());
    let applied = set
        .replace(StepSpecification::default().with_max_final_expressions(10), never)
        .expect("replace succeeds");
    assert_eq!(applied, 4);
    assert_eq!(set.live_expression_count(), 10);
    assert_eq!(
        set.termination_reason(),
        TerminationReason::MaxFinalExpressions
    );
}

#[test]
fn max_final_atoms_refuses_the_overflowing_event() {
    // Each event keeps every input atom and mints exactly one new atom.
    let mut set = build(vec![branching_rule()], self_loops());
    let applied = set
        .replace(StepSpecification::default().with_max_final_atoms(5), never)
        .expect("replace succeeds");
    assert_eq!(applied, 4);
    assert_eq!(set.atom_count(), 5);
    assert_eq!(distinct_live_atoms(&set).len(), 5);
    assert_eq!(set.termination_reason(), TerminationReason::MaxFinalAtoms);
}

#[test]
fn max_final_atom_degree_refuses_the_overflowing_event() {
    let mut set = build(vec![growth_rule()], vec![vec![1, 2]]);
    let applied = set
        .replace(StepSpecification::default().with_max_final_atom_degree(2), never)
        .expect("replace succeeds");
    // The second candidate would put atom 2 in three live expressions.
    assert_eq!(applied, 1);
    assert_eq!(set.max_atom_degree(), 2);
    assert_eq!(
        set.termination_reason(),
        TerminationReason::MaxFinalAtomDegree
    );
}

#[test]
fn refused_candidate_leaves_state_untouched() {
    let mut set = build(vec![branching_rule()], self_loops());
    set.replace(StepSpecification::default().with_max_events(2), never)
        .expect("replace succeeds");
    let digest = set.history_digest();
    let live = set.live_expression_count();

    let applied = set
        .replace(
            StepSpecification::default().with_max_final_expressions(live),
            never,
        )
        .expect("replace succeeds");
    assert_eq!(applied, 0);
    assert_eq!(set.history_digest(), digest);
}

#[test]
fn shrinking_events_pass_limits_already_exceeded() {
    // Path contraction removes one expression and one atom per event.
    let contract = Rule::new(vec![vec![-1, -2], vec![-2, -3]], vec![vec![-1, -3]]);
    let mut set = build(
        vec![contract],
        vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![4, 5]],
    );
    let applied = set
        .replace(
            StepSpecification::default()
                .with_max_final_expressions(2)
                .with_max_final_atoms(3)
                .with_max_final_atom_degree(1),
            never,
        )
        .expect("replace succeeds");
    assert_eq!(applied, 3);
    assert_eq!(live_atoms(&set), vec![vec![1, 5]]);
    assert_eq!(set.termination_reason(), TerminationReason::FixedPoint);
}

#[test]
fn growing_events_are_refused_once_over_a_limit() {
    // Starts with 4 live expressions against a bound of 2; growth is refused.
    let mut set = build(
        vec![growth_rule()],
        vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![7, 8]],
    );
    let applied = set
        .replace(
            StepSpecification::default().with_max_final_expressions(2),
            never,
        )
        .expect("replace succeeds");
    assert_eq!(applied, 0);
    assert_eq!(
        set.termination_reason(),
        TerminationReason::MaxFinalExpressions
    );
}

#[test]
fn generation_cap_hides_capped_expressions() {
    // Growth from one edge is a binary tree of events: 1 + 2 + 4 below generation 3.
    let mut set = build(vec![growth_rule()], vec![vec![1, 2]]);
    let applied = set
        .replace(
            StepSpecification::default().with_max_generations_local(3),
            never,
        )
        .expect("replace succeeds");
    assert_eq!(applied, 7);
    assert_eq!(set.live_expression_count(), 8);
    assert_eq!(set.max_generation(), 3);
    assert!(set
        .expressions()
        .iter()
        .filter(|expression| expression.is_live())
        .all(|expression| expression.generation == 3));
    assert_eq!(
        set.termination_reason(),
        TerminationReason::MaxGenerationsLocal
    );
}

#[test]
fn generation_cap_bounds_depth_not_count() {
    // A generous event budget never reaches past the generation cap...
    let mut capped = build(vec![growth_rule()], vec![vec![1, 2]]);
    let capped_count = capped
        .replace(
            StepSpecification::default()
                .with_max_generations_local(2)
                .with_max_events(100),
            never,
        )
        .expect("replace succeeds");
    assert_eq!(capped_count, 3);
    assert_eq!(capped.max_generation(), 2);

    // ...while one extra event without the cap already does.
    let mut counted = build(vec![growth_rule()], vec![vec![1, 2]]);
    counted
        .replace(StepSpecification::default().with_max_events(4), never)
        .expect("replace succeeds");
    assert_eq!(counted.max_generation(), 3);
}

#[test]
fn fixed_point_is_idempotent() {
    // Path contraction: {{x, y}, {y, z}} -> {{x, z}}.
    let contract = Rule::new(vec![vec![-1, -2], vec![-2, -3]], vec![vec![-1, -3]]);
    let mut set = build(
        vec![contract],
        vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![4, 5]],
    );
    let applied = set
        .replace(StepSpecification::default(), never)
        .expect("replace succeeds");
    assert_eq!(applied, 3);
    assert_eq!(set.termination_reason(), TerminationReason::FixedPoint);
    assert_eq!(live_atoms(&set), vec![vec![1, 5]]);
    assert_eq!(set.max_generation(), 2);

    let digest = set.history_digest();
    let again = set
        .replace(StepSpecification::default(), never)
        .expect("replace succeeds");
    assert_eq!(again, 0);
    assert_eq!(set.history_digest(), digest);
    assert_eq!(set.termination_reason(), TerminationReason::FixedPoint);
}
