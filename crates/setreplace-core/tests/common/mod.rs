// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::collections::BTreeSet;

use setreplace_core::{Atom, Rule, Set};

/// Cancellation predicate that never fires.
pub fn never() -> bool {
    false
}

/// Installs a test subscriber honoring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `{{x, y}} -> {{x, y}, {y, z}}` with `z` fresh.
pub fn growth_rule() -> Rule {
    Rule::new(vec![vec![-1, -2]], vec![vec![-1, -2], vec![-2, -3]])
}

/// `{{x, y}, {x, z}} -> {{x, z}, {x, w}, {y, w}, {z, w}}` with `w` fresh.
///
/// The classic two-edge growth rule; its pattern is connected through `x`.
pub fn branching_rule() -> Rule {
    Rule::new(
        vec![vec![-1, -2], vec![-1, -3]],
        vec![vec![-1, -3], vec![-1, -4], vec![-2, -4], vec![-3, -4]],
    )
}

/// Builds a set, failing the test on construction errors.
pub fn build(rules: Vec<Rule>, initial: Vec<Vec<Atom>>) -> Set {
    Set::new(rules, initial).expect("set construction succeeds")
}

/// Atoms of live expressions, in creation order.
pub fn live_atoms(set: &Set) -> Vec<Vec<Atom>> {
    set.expressions()
        .iter()
        .filter(|expression| expression.is_live())
        .map(|expression| expression.atoms.clone())
        .collect()
}

/// Distinct atoms across live expressions.
pub fn distinct_live_atoms(set: &Set) -> BTreeSet<Atom> {
    live_atoms(set).into_iter().flatten().collect()
}
