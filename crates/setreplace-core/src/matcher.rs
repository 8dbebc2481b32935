// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backtracking matcher that enumerates rule applications around one expression.
//!
//! Matching is seeded: every search pins one live expression to one pattern
//! hyperedge and enumerates all completions of that partial binding. The
//! [`crate::match_set::MatchSet`] seeds a search only from expressions that
//! are new since the last step, so the work per event stays proportional to
//! the neighborhood of what changed.
//!
//! The partial state lives on an explicit stack of frames, one per assigned
//! pattern hyperedge. At each level the search opens the unassigned pattern
//! hyperedge with the fewest candidates: hyperedges touching an already-bound
//! variable (or a literal atom) are resolved through the atom index, and only
//! a hyperedge with no anchor at all falls back to scanning the live set.
//! Candidates are tried in ascending [`ExpressionId`] order.
use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::atoms_index::AtomsIndex;
use crate::ident::{is_pattern_variable, Atom, ExpressionId};
use crate::record::Expression;
use crate::rule::Rule;
use crate::set::SetError;

/// Backtracking steps between cancellation polls once below the seed.
const ABORT_POLL_INTERVAL: u64 = 1024;

/// A complete binding of one rule's pattern onto distinct live expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Match {
    rule: usize,
    inputs: Vec<ExpressionId>,
    binding: BTreeMap<Atom, Atom>,
}

impl Match {
    /// Rebuilds the binding of `rule` over `inputs`, given in pattern order.
    ///
    /// Returns `None` if the expressions do not fit the pattern.
    pub(crate) fn bind(
        rule_idx: usize,
        rule: &Rule,
        inputs: Vec<ExpressionId>,
        expressions: &[Expression],
    ) -> Option<Self> {
        if inputs.len() != rule.inputs().len() {
            return None;
        }
        let mut binding = BTreeMap::new();
        for (pattern, id) in rule.inputs().iter().zip(&inputs) {
            let expression = expressions.get(id.index())?;
            if expression.atoms.len() != pattern.len() {
                return None;
            }
            for (&pattern_atom, &atom) in pattern.iter().zip(&expression.atoms) {
                if is_pattern_variable(pattern_atom) {
                    if *binding.entry(pattern_atom).or_insert(atom) != atom {
                        return None;
                    }
                } else if pattern_atom != atom {
                    return None;
                }
            }
        }
        Some(Self {
            rule: rule_idx,
            inputs,
            binding,
        })
    }

    /// Declaration index of the matched rule.
    pub(crate) fn rule(&self) -> usize {
        self.rule
    }

    /// Matched expressions, parallel to the rule's pattern hyperedges.
    pub(crate) fn inputs(&self) -> &[ExpressionId] {
        &self.inputs
    }

    /// Atom bound to a pattern variable.
    pub(crate) fn bound(&self, variable: Atom) -> Option<Atom> {
        self.binding.get(&variable).copied()
    }
}

/// Read-only view of the state the matcher searches.
#[derive(Clone, Copy)]
pub(crate) struct MatchView<'a> {
    pub(crate) expressions: &'a [Expression],
    pub(crate) live: &'a BTreeSet<ExpressionId>,
    pub(crate) index: &'a AtomsIndex,
}

impl MatchView<'_> {
    fn fits(&self, id: ExpressionId, arity: usize) -> bool {
        self.expressions
            .get(id.index())
            .is_some_and(|expression| expression.atoms.len() == arity)
    }
}

/// Calls `visit` with the inputs (in pattern order) of every match of `rule`
/// that uses the live expression `seed`.
///
/// Each match is visited once per seed. Returns [`SetError::Aborted`] as soon
/// as `should_abort` answers `true`; matches visited before that stay valid.
pub(crate) fn for_each_match_touching(
    rule_idx: usize,
    rule: &Rule,
    view: MatchView<'_>,
    seed: ExpressionId,
    should_abort: &dyn Fn() -> bool,
    visit: &mut dyn FnMut(&[ExpressionId]),
) -> Result<(), SetError> {
    let Some(seed_arity) = view.expressions.get(seed.index()).map(|e| e.atoms.len()) else {
        return Ok(());
    };
    for (pattern_edge, pattern) in rule.inputs().iter().enumerate() {
        if pattern.len() != seed_arity {
            continue;
        }
        let mut search = Search::seeded(rule, view, pattern_edge, seed);
        search.run(should_abort, visit)?;
        trace!(
            rule = rule_idx,
            %seed,
            pattern_edge,
            steps = search.steps,
            "seeded search finished"
        );
    }
    Ok(())
}

struct Frame {
    pattern_edge: usize,
    candidates: Vec<ExpressionId>,
    cursor: usize,
    /// Variables first bound by the candidate currently assigned at this frame.
    bound_here: Vec<Atom>,
}

struct Search<'a> {
    rule: &'a Rule,
    view: MatchView<'a>,
    binding: BTreeMap<Atom, Atom>,
    assigned: Vec<Option<ExpressionId>>,
    used: BTreeSet<ExpressionId>,
    stack: Vec<Frame>,
    steps: u64,
}

impl<'a> Search<'a> {
    fn seeded(
        rule: &'a Rule,
        view: MatchView<'a>,
        pattern_edge: usize,
        seed: ExpressionId,
    ) -> Self {
        let mut stack = Vec::with_capacity(rule.inputs().len());
        stack.push(Frame {
            pattern_edge,
            candidates: vec![seed],
            cursor: 0,
            bound_here: Vec::new(),
        });
        Self {
            rule,
            view,
            binding: BTreeMap::new(),
            assigned: vec![None; rule.inputs().len()],
            used: BTreeSet::new(),
            stack,
            steps: 0,
        }
    }

    fn run(
        &mut self,
        should_abort: &dyn Fn() -> bool,
        visit: &mut dyn FnMut(&[ExpressionId]),
    ) -> Result<(), SetError> {
        while let Some(depth) = self.stack.len().checked_sub(1) {
            self.retract(depth);
            let frame = &mut self.stack[depth];
            if frame.cursor >= frame.candidates.len() {
                self.stack.pop();
                continue;
            }
            let candidate = frame.candidates[frame.cursor];
            frame.cursor += 1;
            let pattern_edge = frame.pattern_edge;

            self.steps += 1;
            if (depth == 0 || self.steps.is_multiple_of(ABORT_POLL_INTERVAL)) && should_abort() {
                return Err(SetError::Aborted);
            }

            if !self.try_assign(depth, pattern_edge, candidate) {
                continue;
            }
            if self.stack.len() == self.rule.inputs().len() {
                let inputs: Vec<ExpressionId> = self.assigned.iter().flatten().copied().collect();
                visit(&inputs);
                continue;
            }
            if let Some(next) = self.open_frame() {
                self.stack.push(next);
            }
        }
        Ok(())
    }

    /// Undoes the assignment currently held by the frame at `depth`, if any.
    fn retract(&mut self, depth: usize) {
        let frame = &mut self.stack[depth];
        if let Some(id) = self.assigned[frame.pattern_edge].take() {
            self.used.remove(&id);
            for variable in frame.bound_here.drain(..) {
                self.binding.remove(&variable);
            }
        }
    }

    fn try_assign(&mut self, depth: usize, pattern_edge: usize, candidate: ExpressionId) -> bool {
        let rule = self.rule;
        let view = self.view;
        let pattern = &rule.inputs()[pattern_edge];
        if self.used.contains(&candidate) || !view.live.contains(&candidate) {
            return false;
        }
        let Some(expression) = view.expressions.get(candidate.index()) else {
            return false;
        };
        if expression.atoms.len() != pattern.len() {
            return false;
        }

        let mut bound_here = Vec::new();
        for (&pattern_atom, &atom) in pattern.iter().zip(&expression.atoms) {
            let consistent = if is_pattern_variable(pattern_atom) {
                match self.binding.get(&pattern_atom) {
                    Some(&bound) => bound == atom,
                    None => {
                        self.binding.insert(pattern_atom, atom);
                        bound_here.push(pattern_atom);
                        true
                    }
                }
            } else {
                pattern_atom == atom
            };
            if !consistent {
                for variable in bound_here {
                    self.binding.remove(&variable);
                }
                return false;
            }
        }

        self.assigned[pattern_edge] = Some(candidate);
        self.used.insert(candidate);
        self.stack[depth].bound_here = bound_here;
        true
    }

    /// Picks the unassigned pattern hyperedge with the fewest candidates.
    fn open_frame(&self) -> Option<Frame> {
        let rule = self.rule;
        let mut best: Option<(usize, Vec<ExpressionId>)> = None;
        let mut unanchored = Vec::new();

        for (edge_idx, pattern) in rule.inputs().iter().enumerate() {
            if self.assigned[edge_idx].is_some() {
                continue;
            }
            let anchors: Vec<Atom> = pattern
                .iter()
                .filter_map(|&atom| {
                    if is_pattern_variable(atom) {
                        self.binding.get(&atom).copied()
                    } else {
                        Some(atom)
                    }
                })
                .collect();
            if anchors.is_empty() {
                unanchored.push(edge_idx);
                continue;
            }
            let candidates = self.anchored_candidates(pattern.len(), &anchors);
            let dead_end = candidates.is_empty();
            if best
                .as_ref()
                .is_none_or(|(_, current)| candidates.len() < current.len())
            {
                best = Some((edge_idx, candidates));
            }
            if dead_end {
                break;
            }
        }

        // Unanchored hyperedges scan the live set, so they only open when
        // nothing anchored is left.
        if best.is_none() {
            for edge_idx in unanchored {
                let candidates = self.all_candidates(rule.inputs()[edge_idx].len());
                if best
                    .as_ref()
                    .is_none_or(|(_, current)| candidates.len() < current.len())
                {
                    best = Some((edge_idx, candidates));
                }
            }
        }

        let (pattern_edge, candidates) = best?;
        Some(Frame {
            pattern_edge,
            candidates,
            cursor: 0,
            bound_here: Vec::new(),
        })
    }

    /// Live expressions containing every anchor atom, smallest bucket first.
    fn anchored_candidates(&self, arity: usize, anchors: &[Atom]) -> Vec<ExpressionId> {
        let mut buckets = Vec::with_capacity(anchors.len());
        for &atom in anchors {
            match self.view.index.expressions_with(atom) {
                Some(bucket) => buckets.push(bucket),
                None => return Vec::new(),
            }
        }
        buckets.sort_by_key(|bucket| bucket.len());
        let Some((smallest, rest)) = buckets.split_first() else {
            return Vec::new();
        };
        smallest
            .iter()
            .copied()
            .filter(|id| rest.iter().all(|bucket| bucket.contains(id)))
            .filter(|&id| !self.used.contains(&id) && self.view.fits(id, arity))
            .collect()
    }

    fn all_candidates(&self, arity: usize) -> Vec<ExpressionId> {
        self.view
            .live
            .iter()
            .copied()
            .filter(|&id| !self.used.contains(&id) && self.view.fits(id, arity))
            .collect()
    }
}
