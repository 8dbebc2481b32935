// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incrementally maintained set of every match in the live hypergraph.
//!
//! Expressions enter a pending queue when they are created. Before a match
//! is chosen, each pending expression seeds a search for the matches that
//! use it; nothing else is rescanned. Retiring an expression drops every
//! match that used it.
//!
//! Matches are kept per rule and bucketed by generation (the largest
//! generation among their inputs), so a generation cap filters whole buckets.
//! Within a bucket, matches are ordered by their inputs in pattern order.
use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::ident::ExpressionId;
use crate::matcher::{for_each_match_touching, MatchView};
use crate::record::Expression;
use crate::rule::Rule;
use crate::set::SetError;

/// Identity of one stored match, used for back-references from inputs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MatchKey {
    rule: usize,
    generation: u64,
    inputs: Vec<ExpressionId>,
}

#[derive(Debug, Clone)]
pub(crate) struct MatchSet {
    /// Live expressions whose matches have not been enumerated yet.
    pending: BTreeSet<ExpressionId>,
    /// rule -> generation -> inputs, in pattern order.
    by_rule: Vec<BTreeMap<u64, BTreeSet<Vec<ExpressionId>>>>,
    /// expression -> matches using it.
    by_expression: FxHashMap<ExpressionId, BTreeSet<MatchKey>>,
}

impl MatchSet {
    pub(crate) fn new(rule_count: usize) -> Self {
        Self {
            pending: BTreeSet::new(),
            by_rule: vec![BTreeMap::new(); rule_count],
            by_expression: FxHashMap::default(),
        }
    }

    /// Queues a newly live expression for enumeration.
    pub(crate) fn enqueue(&mut self, id: ExpressionId) {
        self.pending.insert(id);
    }

    /// Drops every match that uses `id`.
    pub(crate) fn retire(&mut self, id: ExpressionId) {
        self.pending.remove(&id);
        let Some(keys) = self.by_expression.remove(&id) else {
            return;
        };
        for key in keys {
            if let Some(buckets) = self.by_rule.get_mut(key.rule) {
                if let Some(bucket) = buckets.get_mut(&key.generation) {
                    bucket.remove(&key.inputs);
                    if bucket.is_empty() {
                        buckets.remove(&key.generation);
                    }
                }
            }
            for other in key.inputs.iter().filter(|&&other| other != id) {
                if let Some(uses) = self.by_expression.get_mut(other) {
                    uses.remove(&key);
                    if uses.is_empty() {
                        self.by_expression.remove(other);
                    }
                }
            }
        }
    }

    /// Enumerates matches for every pending expression, lowest id first.
    ///
    /// On [`SetError::Aborted`] the expression being searched stays pending;
    /// matches already recorded remain valid and re-recording them is a no-op.
    pub(crate) fn refresh(
        &mut self,
        rules: &[Rule],
        view: MatchView<'_>,
        should_abort: &dyn Fn() -> bool,
    ) -> Result<(), SetError> {
        while let Some(&seed) = self.pending.first() {
            if view.live.contains(&seed) {
                for (rule_idx, rule) in rules.iter().enumerate() {
                    for_each_match_touching(
                        rule_idx,
                        rule,
                        view,
                        seed,
                        should_abort,
                        &mut |inputs: &[ExpressionId]| {
                            self.record(rule_idx, inputs, view.expressions);
                        },
                    )?;
                }
            }
            self.pending.remove(&seed);
        }
        Ok(())
    }

    /// First match in rule order whose generation is below `generation_cap`.
    ///
    /// Within a rule the match with the lexicographically smallest inputs
    /// (in pattern order) wins.
    pub(crate) fn first(&self, generation_cap: Option<u64>) -> Option<(usize, &[ExpressionId])> {
        for (rule_idx, buckets) in self.by_rule.iter().enumerate() {
            let best = buckets
                .iter()
                .take_while(|&(&generation, _)| generation_cap.is_none_or(|cap| generation < cap))
                .filter_map(|(_, bucket)| bucket.first())
                .min();
            if let Some(inputs) = best {
                return Some((rule_idx, inputs.as_slice()));
            }
        }
        None
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_rule
            .iter()
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }

    fn record(&mut self, rule: usize, inputs: &[ExpressionId], expressions: &[Expression]) {
        let generation = inputs
            .iter()
            .filter_map(|id| expressions.get(id.index()))
            .map(|expression| expression.generation)
            .max()
            .unwrap_or(0);
        let Some(buckets) = self.by_rule.get_mut(rule) else {
            return;
        };
        if !buckets
            .entry(generation)
            .or_default()
            .insert(inputs.to_vec())
        {
            return;
        }
        let key = MatchKey {
            rule,
            generation,
            inputs: inputs.to_vec(),
        };
        for &id in inputs {
            self.by_expression.entry(id).or_default().insert(key.clone());
        }
    }
}
