// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Substitution rule definitions.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::ident::{is_pattern_variable, Atom, AtomsVector};

/// Immutable pattern → replacement pair.
///
/// Atom conventions:
/// * `atom <= 0` is a pattern variable. Repeating a variable across pattern
///   hyperedges requires the matched expressions to share that atom.
/// * `atom > 0` is a literal atom. In the pattern it must match exactly; in
///   the replacement it is emitted verbatim.
/// * A replacement variable that never occurs in the pattern is a placeholder:
///   every application mints one fresh atom for it, shared across all
///   replacement hyperedges of that application.
///
/// Connectivity of the pattern side is checked by [`crate::Set::new`], not
/// here, so rules can be built up front and validated as a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    inputs: Vec<AtomsVector>,
    outputs: Vec<AtomsVector>,
}

impl Rule {
    /// Creates a rule from its pattern (`inputs`) and replacement (`outputs`) sides.
    #[must_use]
    pub fn new(inputs: Vec<AtomsVector>, outputs: Vec<AtomsVector>) -> Self {
        Self { inputs, outputs }
    }

    /// Pattern hyperedges, in declaration order.
    #[must_use]
    pub fn inputs(&self) -> &[AtomsVector] {
        &self.inputs
    }

    /// Replacement hyperedges, in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[AtomsVector] {
        &self.outputs
    }

    /// Returns `true` if the pattern hyperedges form a single connected component.
    ///
    /// Two pattern hyperedges are adjacent when they share any atom, variable
    /// or literal. An empty pattern has no component and is not connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let Some(first) = self.inputs.first() else {
            return false;
        };

        let mut edges_by_atom: BTreeMap<Atom, Vec<usize>> = BTreeMap::new();
        for (edge_idx, edge) in self.inputs.iter().enumerate() {
            for &atom in edge {
                edges_by_atom.entry(atom).or_default().push(edge_idx);
            }
        }

        let mut visited = vec![false; self.inputs.len()];
        let mut queue: VecDeque<&AtomsVector> = VecDeque::new();
        visited[0] = true;
        queue.push_back(first);
        let mut reached = 1usize;

        while let Some(edge) = queue.pop_front() {
            for atom in edge {
                for &next in edges_by_atom.get(atom).into_iter().flatten() {
                    if !visited[next] {
                        visited[next] = true;
                        reached += 1;
                        queue.push_back(&self.inputs[next]);
                    }
                }
            }
        }

        reached == self.inputs.len()
    }

    /// Largest literal atom mentioned anywhere in the rule, if any.
    pub(crate) fn max_literal_atom(&self) -> Option<Atom> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .flatten()
            .copied()
            .filter(|&atom| !is_pattern_variable(atom))
            .max()
    }

    /// Replacement variables that are not bound by the pattern, in first-use order.
    pub(crate) fn placeholders(&self) -> Vec<Atom> {
        let bound: BTreeSet<Atom> = self.inputs.iter().flatten().copied().collect();
        let mut seen = BTreeSet::new();
        self.outputs
            .iter()
            .flatten()
            .copied()
            .filter(|&atom| is_pattern_variable(atom) && !bound.contains(&atom))
            .filter(|&atom| seen.insert(atom))
            .collect()
    }
}
