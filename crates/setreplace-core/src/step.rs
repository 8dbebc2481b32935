// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Step specification and termination reasons for [`crate::Set::replace`].

/// Conditions upon which [`crate::Set::replace`] stops.
///
/// Every field is an upper bound; zero means unbounded. A run stops at the
/// first limit reached, at a fixed point, or on cancellation.
///
/// `max_generations_local` is local in the sense that expressions at or above
/// that generation are never even matched. Capping generations can therefore
/// produce a different evolution than capping the event count.
///
/// The `max_final_*` limits refuse the next candidate event if applying it
/// would push the live hypergraph over the bound; the refused candidate is
/// discarded without touching state. All three use the same rule: an event is
/// refused only when it grows the measured quantity (distinct atoms, the
/// degree of some atom, live expressions) to a value above the bound. A set
/// that already exceeds a bound can therefore still apply events that keep
/// that quantity flat or shrink it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepSpecification {
    /// Stop after this many successful applications.
    pub max_events: usize,
    /// Hide expressions at or above this generation from matching.
    pub max_generations_local: u64,
    /// Refuse an event that would exceed this many distinct live atoms.
    pub max_final_atoms: usize,
    /// Refuse an event that would put any atom in more than this many live expressions.
    pub max_final_atom_degree: usize,
    /// Refuse an event that would exceed this many live expressions.
    pub max_final_expressions: usize,
}

impl StepSpecification {
    /// Returns a copy with `max_events` set.
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Returns a copy with `max_generations_local` set.
    pub fn with_max_generations_local(mut self, max_generations_local: u64) -> Self {
        self.max_generations_local = max_generations_local;
        self
    }

    /// Returns a copy with `max_final_atoms` set.
    pub fn with_max_final_atoms(mut self, max_final_atoms: usize) -> Self {
        self.max_final_atoms = max_final_atoms;
        self
    }

    /// Returns a copy with `max_final_atom_degree` set.
    pub fn with_max_final_atom_degree(mut self, max_final_atom_degree: usize) -> Self {
        self.max_final_atom_degree = max_final_atom_degree;
        self
    }

    /// Returns a copy with `max_final_expressions` set.
    pub fn with_max_final_expressions(mut self, max_final_expressions: usize) -> Self {
        self.max_final_expressions = max_final_expressions;
        self
    }

    pub(crate) fn event_limit(&self) -> Option<usize> {
        bound(self.max_events)
    }

    pub(crate) fn generation_cap(&self) -> Option<u64> {
        (self.max_generations_local > 0).then_some(self.max_generations_local)
    }

    pub(crate) fn atom_limit(&self) -> Option<usize> {
        bound(self.max_final_atoms)
    }

    pub(crate) fn atom_degree_limit(&self) -> Option<usize> {
        bound(self.max_final_atom_degree)
    }

    pub(crate) fn expression_limit(&self) -> Option<usize> {
        bound(self.max_final_expressions)
    }
}

fn bound(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}

/// Why the most recent [`crate::Set::replace`] run stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// No `replace` run has finished yet.
    #[default]
    NotTerminated,
    /// `max_events` applications were made.
    MaxEvents,
    /// No match remains below the generation cap, but capped expressions are live.
    MaxGenerationsLocal,
    /// The next event would have exceeded `max_final_atoms`.
    MaxFinalAtoms,
    /// The next event would have exceeded `max_final_atom_degree`.
    MaxFinalAtomDegree,
    /// The next event would have exceeded `max_final_expressions`.
    MaxFinalExpressions,
    /// No rule matches anywhere in the live hypergraph.
    FixedPoint,
    /// The cancellation predicate answered `true`.
    Aborted,
}
