// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for atoms, expressions, and events.

/// Canonical 256-bit hash used for history digests.
pub type Hash = [u8; 32];

/// Integer token naming a vertex of the hypergraph.
///
/// Atoms in live expressions are always positive. Inside a [`crate::Rule`],
/// non-positive values name pattern variables; positive values are literal
/// atoms that must match exactly.
pub type Atom = i64;

/// Ordered sequence of atoms forming one hyperedge.
///
/// Order is significant: `[1, 2]` and `[2, 1]` are different hyperedges.
pub type AtomsVector = Vec<Atom>;

/// Returns `true` when `atom` names a pattern variable rather than a literal atom.
#[inline]
pub(crate) const fn is_pattern_variable(atom: Atom) -> bool {
    atom <= 0
}

/// Stable identifier of an expression in the append-only expression store.
///
/// Identifiers are dense and assigned in creation order, so an
/// `ExpressionId` doubles as the expression's index in
/// [`crate::Set::expressions`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpressionId(pub usize);

impl ExpressionId {
    /// Returns the position of this expression in the store.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "expr{}", self.0)
    }
}

/// Stable identifier of an event in the append-only event log.
///
/// Matches the event's position in [`crate::Set::events`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(pub usize);

impl EventId {
    /// Returns the position of this event in the log.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "event{}", self.0)
    }
}
