// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the `setreplace-core` benchmarks.

use setreplace_core::{Atom, Rule, Set, SetError, StepSpecification};

/// `{{x, y}, {x, z}} -> {{x, z}, {x, w}, {y, w}, {z, w}}` with `w` fresh.
#[must_use]
pub fn branching_rule() -> Rule {
    Rule::new(
        vec![vec![-1, -2], vec![-1, -3]],
        vec![vec![-1, -3], vec![-1, -4], vec![-2, -4], vec![-3, -4]],
    )
}

/// `{{x, y}, {y, z}} -> {{x, z}}`: contracts a path by one edge.
#[must_use]
pub fn contraction_rule() -> Rule {
    Rule::new(vec![vec![-1, -2], vec![-2, -3]], vec![vec![-1, -3]])
}

/// A directed chain `1 -> 2 -> ... -> n + 1` of `n` binary expressions.
#[must_use]
pub fn chain(n: usize) -> Vec<Vec<Atom>> {
    (1..).take(n).map(|atom: Atom| vec![atom, atom + 1]).collect()
}

/// `isolated` disjoint binary edges far from the atoms of [`chain`].
#[must_use]
pub fn isolated_edges(isolated: usize) -> Vec<Vec<Atom>> {
    (0..)
        .take(isolated)
        .map(|k: Atom| vec![1_000_000 + 2 * k, 1_000_001 + 2 * k])
        .collect()
}

/// Two self-loops on atom `1`, the usual seed for [`branching_rule`].
#[must_use]
pub fn self_loops() -> Vec<Vec<Atom>> {
    vec![vec![1, 1], vec![1, 1]]
}

/// Builds a branching-rule set evolved for `events` events.
///
/// # Errors
/// Propagates construction and replace failures.
pub fn evolved_branching(events: usize) -> Result<Set, SetError> {
    let mut set = Set::new(vec![branching_rule()], self_loops())?;
    set.replace(StepSpecification::default().with_max_events(events), || false)?;
    Ok(set)
}
