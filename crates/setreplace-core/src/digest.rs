// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical history digest.
//!
//! The digest commits to every expression and event in store order. All
//! integers are encoded little-endian at fixed width, sequences are length
//! prefixed with a `u64`, and optional event references are tagged with a
//! single byte (`0` = absent, `1` = present). Changing any of this is a
//! breaking change to digest identity.
use blake3::Hasher;

use crate::ident::{EventId, ExpressionId, Hash};
use crate::record::{Event, Expression};

/// Version tag committed as the first two bytes of every digest.
const HISTORY_DIGEST_VERSION: u16 = 1;

pub(crate) fn compute_history_digest(expressions: &[Expression], events: &[Event]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(&HISTORY_DIGEST_VERSION.to_le_bytes());

    hasher.update(&(expressions.len() as u64).to_le_bytes());
    for expression in expressions {
        hash_expression_id(&mut hasher, expression.id);
        hasher.update(&(expression.atoms.len() as u64).to_le_bytes());
        for atom in &expression.atoms {
            hasher.update(&atom.to_le_bytes());
        }
        hasher.update(&expression.generation.to_le_bytes());
        hash_optional_event(&mut hasher, expression.creator);
        hash_optional_event(&mut hasher, expression.destroyer);
    }

    hasher.update(&(events.len() as u64).to_le_bytes());
    for event in events {
        hasher.update(&(event.id.index() as u64).to_le_bytes());
        hasher.update(&(event.rule as u64).to_le_bytes());
        hasher.update(&(event.inputs.len() as u64).to_le_bytes());
        for &id in &event.inputs {
            hash_expression_id(&mut hasher, id);
        }
        hasher.update(&(event.outputs.len() as u64).to_le_bytes());
        for &id in &event.outputs {
            hash_expression_id(&mut hasher, id);
        }
        hasher.update(&event.generation.to_le_bytes());
    }

    hasher.finalize().into()
}

fn hash_expression_id(hasher: &mut Hasher, id: ExpressionId) {
    hasher.update(&(id.index() as u64).to_le_bytes());
}

fn hash_optional_event(hasher: &mut Hasher, event: Option<EventId>) {
    match event {
        None => {
            hasher.update(&[0u8]);
        }
        Some(id) => {
            hasher.update(&[1u8]);
            hasher.update(&(id.index() as u64).to_le_bytes());
        }
    }
}
