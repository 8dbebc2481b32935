// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stepping controller: owns the rules, the expression store, the event log,
//! and the atom index, and exposes the only mutating operations.
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug_span;

use crate::atoms_index::AtomsIndex;
use crate::digest::compute_history_digest;
use crate::ident::{is_pattern_variable, Atom, AtomsVector, EventId, ExpressionId, Hash};
use crate::match_set::MatchSet;
use crate::matcher::{Match, MatchView};
use crate::record::{Event, Expression};
use crate::rule::Rule;
use crate::step::{StepSpecification, TerminationReason};
use crate::telemetry;

/// Errors emitted by a [`Set`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// The cancellation predicate answered `true`.
    ///
    /// Not a defect: every event committed before the signal remains valid,
    /// and the set can be evolved again later.
    #[error("evolution aborted")]
    Aborted,
    /// A rule's pattern hyperedges do not form a single connected component.
    #[error("rule {rule} has disconnected inputs")]
    DisconnectedInputs {
        /// Declaration index of the offending rule.
        rule: usize,
    },
    /// An initial expression contains an atom that is zero or negative.
    #[error("initial expression {expression} contains non-positive atom {atom}")]
    NonPositiveAtoms {
        /// Index of the offending expression in the initial list.
        expression: usize,
        /// The first non-positive atom found in it.
        atom: Atom,
    },
    /// Internal invariant violated (engine state corruption or counter overflow).
    #[error("internal invariant violated: {0}")]
    InternalCorruption(&'static str),
}

/// The evolving set of expressions, together with its full history.
///
/// Construction validates every rule and every initial expression up front;
/// no partially built `Set` is ever observable. After that, only
/// [`Set::replace_once`] and [`Set::replace`] mutate state, and they only
/// ever append: expressions are retired by recording a destroyer, never
/// removed or renumbered.
///
/// Evolution is single-threaded and bit-for-bit reproducible: the same rules,
/// initial expressions, and step specification always yield the same history.
#[derive(Debug, Clone)]
pub struct Set {
    rules: Vec<Rule>,
    /// Placeholder variables of each rule, in first-use order.
    placeholders: Vec<Vec<Atom>>,
    expressions: Vec<Expression>,
    events: Vec<Event>,
    live: BTreeSet<ExpressionId>,
    index: AtomsIndex,
    matches: MatchSet,
    next_atom: Atom,
    termination: TerminationReason,
}

/// A match resolved into concrete outputs but not yet committed.
struct PlannedEvent {
    found: Match,
    outputs: Vec<AtomsVector>,
    generation: u64,
    next_atom: Atom,
}

impl Set {
    /// Creates a set from its rules and initial condition.
    ///
    /// Rules are validated first, in declaration order, then initial
    /// expressions, in order; the first violation is returned.
    ///
    /// # Errors
    /// - [`SetError::DisconnectedInputs`] if a rule's pattern is not connected.
    /// - [`SetError::NonPositiveAtoms`] if an initial expression contains an atom `<= 0`.
    /// - [`SetError::InternalCorruption`] if the atom counter cannot be seeded.
    pub fn new(rules: Vec<Rule>, initial_expressions: Vec<AtomsVector>) -> Result<Self, SetError> {
        let _span = debug_span!(
            "set_new",
            rules = rules.len(),
            expressions = initial_expressions.len()
        )
        .entered();

        if let Some(rule) = rules.iter().position(|rule| !rule.is_connected()) {
            return Err(SetError::DisconnectedInputs { rule });
        }
        for (expression, atoms) in initial_expressions.iter().enumerate() {
            if let Some(&atom) = atoms.iter().find(|&&atom| atom <= 0) {
                return Err(SetError::NonPositiveAtoms { expression, atom });
            }
        }

        // Fresh atoms must not collide with any atom a rule can emit verbatim.
        let max_atom = initial_expressions
            .iter()
            .flatten()
            .copied()
            .chain(rules.iter().filter_map(Rule::max_literal_atom))
            .max()
            .unwrap_or(0);
        let next_atom = max_atom
            .checked_add(1)
            .ok_or(SetError::InternalCorruption("atom counter overflow"))?;

        let placeholders = rules.iter().map(Rule::placeholders).collect();
        let matches = MatchSet::new(rules.len());
        let mut set = Self {
            rules,
            placeholders,
            expressions: Vec::with_capacity(initial_expressions.len()),
            events: Vec::new(),
            live: BTreeSet::new(),
            index: AtomsIndex::default(),
            matches,
            next_atom,
            termination: TerminationReason::NotTerminated,
        };
        for atoms in initial_expressions {
            set.push_expression(atoms, 0, None);
        }
        Ok(set)
    }

    /// Performs at most one substitution.
    ///
    /// Returns `Ok(1)` if an event was applied and `Ok(0)` at a fixed point.
    /// Generation and size limits do not apply here; see [`Set::replace`].
    ///
    /// # Errors
    /// Returns [`SetError::Aborted`] if `should_abort` answers `true` before a
    /// match is committed; nothing is mutated in that case.
    pub fn replace_once<F>(&mut self, should_abort: F) -> Result<usize, SetError>
    where
        F: Fn() -> bool,
    {
        let should_abort: &dyn Fn() -> bool = &should_abort;
        if should_abort() {
            telemetry::aborted("replace_once", 0);
            return Err(SetError::Aborted);
        }
        let Some(found) = self.next_match(None, should_abort)? else {
            return Ok(0);
        };
        let planned = self.plan(found)?;
        self.commit(planned)?;
        Ok(1)
    }

    /// Runs substitutions until a limit in `step_spec`, a fixed point, or cancellation.
    ///
    /// Returns the number of events applied by this call, and records why it
    /// stopped in [`Set::termination_reason`]. A candidate refused by a
    /// `max_final_*` limit is discarded without mutating state.
    ///
    /// # Errors
    /// Returns [`SetError::Aborted`] if `should_abort` answers `true`. Events
    /// applied before the signal are kept; the count is visible through
    /// [`Set::events`].
    pub fn replace<F>(
        &mut self,
        step_spec: StepSpecification,
        should_abort: F,
    ) -> Result<usize, SetError>
    where
        F: Fn() -> bool,
    {
        let should_abort: &dyn Fn() -> bool = &should_abort;
        let generation_cap = step_spec.generation_cap();
        let mut applied = 0usize;

        let reason = loop {
            if step_spec.event_limit().is_some_and(|limit| applied >= limit) {
                break TerminationReason::MaxEvents;
            }
            if should_abort() {
                return Err(self.abort("replace", applied));
            }
            let found = match self.next_match(generation_cap, should_abort) {
                Ok(Some(found)) => found,
                Ok(None) => break self.exhaustion_reason(generation_cap),
                Err(SetError::Aborted) => return Err(self.abort("matcher", applied)),
                Err(err) => return Err(err),
            };
            let planned = self.plan(found)?;
            if let Some(reason) = self.refusal(&planned, &step_spec) {
                telemetry::candidate_refused(planned.found.rule(), reason);
                break reason;
            }
            self.commit(planned)?;
            applied += 1;
        };

        self.termination = reason;
        telemetry::replace_summary(applied, reason);
        Ok(applied)
    }

    /// Every expression ever created, live or retired, in creation order.
    #[must_use]
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    /// Every event applied so far, in application order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The rules this set evolves with, in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Why the most recent [`Set::replace`] call stopped.
    #[must_use]
    pub fn termination_reason(&self) -> TerminationReason {
        self.termination
    }

    /// Number of live expressions.
    #[must_use]
    pub fn live_expression_count(&self) -> usize {
        self.live.len()
    }

    /// Number of distinct atoms among live expressions.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.index.atom_count()
    }

    /// Largest number of live expressions any single atom belongs to.
    #[must_use]
    pub fn max_atom_degree(&self) -> usize {
        self.index.max_degree()
    }

    /// Largest generation among all expressions, live or retired.
    #[must_use]
    pub fn max_generation(&self) -> u64 {
        self.expressions
            .iter()
            .map(|expression| expression.generation)
            .max()
            .unwrap_or(0)
    }

    /// Causal edges `(from, to)`: event `to` consumed an expression created by `from`.
    ///
    /// Pairs are deduplicated and ordered by `to`, then `from`.
    #[must_use]
    pub fn causal_edges(&self) -> Vec<(EventId, EventId)> {
        let mut edges = BTreeSet::new();
        for event in &self.events {
            for input in &event.inputs {
                if let Some(creator) = self
                    .expressions
                    .get(input.index())
                    .and_then(|expression| expression.creator)
                {
                    edges.insert((event.id, creator));
                }
            }
        }
        edges.into_iter().map(|(to, from)| (from, to)).collect()
    }

    /// Canonical BLAKE3 digest over the full expression store and event log.
    ///
    /// Two sets with identical histories produce identical digests.
    #[must_use]
    pub fn history_digest(&self) -> Hash {
        compute_history_digest(&self.expressions, &self.events)
    }
}

impl Set {
    fn push_expression(
        &mut self,
        atoms: AtomsVector,
        generation: u64,
        creator: Option<EventId>,
    ) -> ExpressionId {
        let id = ExpressionId(self.expressions.len());
        self.index.insert(id, &atoms);
        self.live.insert(id);
        self.matches.enqueue(id);
        self.expressions.push(Expression {
            id,
            atoms,
            generation,
            creator,
            destroyer: None,
        });
        id
    }

    /// Brings the match set up to date and picks the next match under the cap.
    fn next_match(
        &mut self,
        generation_cap: Option<u64>,
        should_abort: &dyn Fn() -> bool,
    ) -> Result<Option<Match>, SetError> {
        let view = MatchView {
            expressions: &self.expressions,
            live: &self.live,
            index: &self.index,
        };
        let searched = self.matches.pending_len();
        self.matches.refresh(&self.rules, view, should_abort)?;
        telemetry::matches_refreshed(searched, self.matches.len());

        let Some((rule_idx, inputs)) = self.matches.first(generation_cap) else {
            return Ok(None);
        };
        let Some(rule) = self.rules.get(rule_idx) else {
            return Err(SetError::InternalCorruption("match references a missing rule"));
        };
        Match::bind(rule_idx, rule, inputs.to_vec(), &self.expressions)
            .map(Some)
            .ok_or(SetError::InternalCorruption("indexed match no longer fits its rule"))
    }

    fn abort(&mut self, site: &'static str, applied: usize) -> SetError {
        self.termination = TerminationReason::Aborted;
        telemetry::aborted(site, applied);
        SetError::Aborted
    }

    fn exhaustion_reason(&self, generation_cap: Option<u64>) -> TerminationReason {
        let capped_live = generation_cap.is_some_and(|cap| {
            self.live
                .iter()
                .filter_map(|id| self.expressions.get(id.index()))
                .any(|expression| expression.generation >= cap)
        });
        if capped_live {
            TerminationReason::MaxGenerationsLocal
        } else {
            TerminationReason::FixedPoint
        }
    }

    /// Resolves the replacement side of a match without mutating state.
    fn plan(&self, found: Match) -> Result<PlannedEvent, SetError> {
        let (Some(rule), Some(placeholders)) = (
            self.rules.get(found.rule()),
            self.placeholders.get(found.rule()),
        ) else {
            return Err(SetError::InternalCorruption("match references a missing rule"));
        };

        let mut input_generation = 0u64;
        for id in found.inputs() {
            let Some(expression) = self.expressions.get(id.index()) else {
                return Err(SetError::InternalCorruption(
                    "match references a missing expression",
                ));
            };
            input_generation = input_generation.max(expression.generation);
        }
        let generation = input_generation
            .checked_add(1)
            .ok_or(SetError::InternalCorruption("generation overflow"))?;

        let mut next_atom = self.next_atom;
        let mut fresh: BTreeMap<Atom, Atom> = BTreeMap::new();
        for &placeholder in placeholders {
            fresh.insert(placeholder, next_atom);
            next_atom = next_atom
                .checked_add(1)
                .ok_or(SetError::InternalCorruption("atom counter overflow"))?;
        }

        let mut outputs = Vec::with_capacity(rule.outputs().len());
        for output in rule.outputs() {
            let mut atoms = Vec::with_capacity(output.len());
            for &atom in output {
                let resolved = if is_pattern_variable(atom) {
                    found
                        .bound(atom)
                        .or_else(|| fresh.get(&atom).copied())
                        .ok_or(SetError::InternalCorruption("unresolved replacement atom"))?
                } else {
                    atom
                };
                atoms.push(resolved);
            }
            outputs.push(atoms);
        }

        Ok(PlannedEvent {
            found,
            outputs,
            generation,
            next_atom,
        })
    }

    /// Returns the limit a planned event would break, if any.
    fn refusal(
        &self,
        planned: &PlannedEvent,
        spec: &StepSpecification,
    ) -> Option<TerminationReason> {
        let atom_limit = spec.atom_limit();
        let degree_limit = spec.atom_degree_limit();
        let expression_limit = spec.expression_limit();

        if atom_limit.is_some() || degree_limit.is_some() {
            let mut removed: BTreeMap<Atom, usize> = BTreeMap::new();
            for id in planned.found.inputs() {
                let Some(expression) = self.expressions.get(id.index()) else {
                    continue;
                };
                let distinct: BTreeSet<Atom> = expression.atoms.iter().copied().collect();
                for atom in distinct {
                    *removed.entry(atom).or_default() += 1;
                }
            }
            let mut added: BTreeMap<Atom, usize> = BTreeMap::new();
            for output in &planned.outputs {
                let distinct: BTreeSet<Atom> = output.iter().copied().collect();
                for atom in distinct {
                    *added.entry(atom).or_default() += 1;
                }
            }

            let mut appearing = 0usize;
            let mut vanishing = 0usize;
            let mut degree_exceeded = false;
            let touched: BTreeSet<Atom> = removed.keys().chain(added.keys()).copied().collect();
            for atom in touched {
                let before = self.index.degree(atom);
                let plus = added.get(&atom).copied().unwrap_or(0);
                let minus = removed.get(&atom).copied().unwrap_or(0);
                let after = (before + plus).saturating_sub(minus);
                if before == 0 && after > 0 {
                    appearing += 1;
                }
                if before > 0 && after == 0 {
                    vanishing += 1;
                }
                if plus > minus && degree_limit.is_some_and(|limit| after > limit) {
                    degree_exceeded = true;
                }
            }

            let atoms_before = self.index.atom_count();
            let atoms_after = (atoms_before + appearing).saturating_sub(vanishing);
            if atoms_after > atoms_before && atom_limit.is_some_and(|limit| atoms_after > limit) {
                return Some(TerminationReason::MaxFinalAtoms);
            }
            if degree_exceeded {
                return Some(TerminationReason::MaxFinalAtomDegree);
            }
        }

        let expressions_before = self.live.len();
        let expressions_after =
            (expressions_before + planned.outputs.len()).saturating_sub(planned.found.inputs().len());
        if expressions_after > expressions_before
            && expression_limit.is_some_and(|limit| expressions_after > limit)
        {
            return Some(TerminationReason::MaxFinalExpressions);
        }
        None
    }

    /// Appends the planned event and its outputs, retiring its inputs.
    fn commit(&mut self, planned: PlannedEvent) -> Result<EventId, SetError> {
        let PlannedEvent {
            found,
            outputs,
            generation,
            next_atom,
        } = planned;
        let event_id = EventId(self.events.len());

        for &id in found.inputs() {
            let Some(expression) = self.expressions.get_mut(id.index()) else {
                return Err(SetError::InternalCorruption(
                    "commit references a missing expression",
                ));
            };
            if expression.destroyer.is_some() {
                return Err(SetError::InternalCorruption(
                    "commit consumes a retired expression",
                ));
            }
            expression.destroyer = Some(event_id);
            self.index.remove(id, &expression.atoms);
            self.live.remove(&id);
            self.matches.retire(id);
        }

        let produced: Vec<ExpressionId> = outputs
            .into_iter()
            .map(|atoms| self.push_expression(atoms, generation, Some(event_id)))
            .collect();
        self.next_atom = next_atom;

        let event = Event {
            id: event_id,
            rule: found.rule(),
            inputs: found.inputs().to_vec(),
            outputs: produced,
            generation,
        };
        telemetry::event_applied(&event);
        self.events.push(event);
        Ok(event_id)
    }
}
