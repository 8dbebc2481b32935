// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Inverted index from atoms to the live expressions that contain them.
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::ident::{Atom, ExpressionId};

/// Derived cache over the live subset of the expression store.
///
/// The index never owns expression records; it only maps each atom to the
/// ordered set of live expression ids containing it. Buckets are removed as
/// soon as they become empty, so the number of keys equals the number of
/// distinct atoms in the live hypergraph.
#[derive(Debug, Clone, Default)]
pub(crate) struct AtomsIndex {
    by_atom: FxHashMap<Atom, BTreeSet<ExpressionId>>,
}

impl AtomsIndex {
    /// Records that `id` (with the given atoms) became live.
    pub(crate) fn insert(&mut self, id: ExpressionId, atoms: &[Atom]) {
        for &atom in atoms {
            self.by_atom.entry(atom).or_default().insert(id);
        }
    }

    /// Records that `id` (with the given atoms) was consumed.
    pub(crate) fn remove(&mut self, id: ExpressionId, atoms: &[Atom]) {
        for atom in atoms {
            if let Some(bucket) = self.by_atom.get_mut(atom) {
                bucket.remove(&id);
                if bucket.is_empty() {
                    self.by_atom.remove(atom);
                }
            }
        }
    }

    /// Live expressions containing `atom`, in ascending id order.
    pub(crate) fn expressions_with(&self, atom: Atom) -> Option<&BTreeSet<ExpressionId>> {
        self.by_atom.get(&atom)
    }

    /// Number of live expressions containing `atom`.
    pub(crate) fn degree(&self, atom: Atom) -> usize {
        self.by_atom.get(&atom).map_or(0, BTreeSet::len)
    }

    /// Number of distinct atoms in the live hypergraph.
    pub(crate) fn atom_count(&self) -> usize {
        self.by_atom.len()
    }

    /// Largest degree over all live atoms; `0` for an empty hypergraph.
    pub(crate) fn max_degree(&self) -> usize {
        self.by_atom.values().map(BTreeSet::len).max().unwrap_or(0)
    }
}
