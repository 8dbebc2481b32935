// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! History record types: expressions and events.

use crate::ident::{AtomsVector, EventId, ExpressionId};

/// Materialised record for a single hyperedge ever created by a [`crate::Set`].
///
/// Invariants
/// - `id` equals the record's position in the expression store.
/// - `generation` is `0` for initial expressions; otherwise it is one more
///   than the largest generation among the inputs of `creator`.
/// - `destroyer`, when set, names an event whose `inputs` contain `id`, and
///   that event's generation is strictly greater than `generation`.
/// - Records are never removed or renumbered; an expression is live exactly
///   when `destroyer` is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    /// Stable identifier of the expression.
    pub id: ExpressionId,
    /// Ordered atoms of the hyperedge.
    pub atoms: AtomsVector,
    /// Causal depth of the expression.
    pub generation: u64,
    /// Event that produced the expression; `None` for initial expressions.
    pub creator: Option<EventId>,
    /// Event that consumed the expression; `None` while it is live.
    pub destroyer: Option<EventId>,
}

impl Expression {
    /// Returns `true` if no event has consumed this expression yet.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.destroyer.is_none()
    }
}

/// Immutable record of one rule application.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Stable identifier; equals the event's position in the log.
    pub id: EventId,
    /// Declaration index of the rule that was applied.
    pub rule: usize,
    /// Consumed expressions, in the order of the rule's pattern hyperedges.
    pub inputs: Vec<ExpressionId>,
    /// Produced expressions, in the order of the rule's replacement hyperedges.
    pub outputs: Vec<ExpressionId>,
    /// Generation shared by every produced expression.
    pub generation: u64,
}
