// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! setreplace-core: deterministic hypergraph substitution engine.
//!
//! A [`Set`] holds a collection of ordered hyperedges ("expressions") over
//! integer atoms and evolves it by repeatedly finding a place where a
//! [`Rule`]'s pattern matches a subset of live expressions and replacing that
//! subset with the rule's output. Every expression ever created is kept, with
//! its generation, creator event, and destroyer event, so the full causal
//! history of an evolution can be audited after the fact.
//!
//! ```
//! use setreplace_core::{Rule, Set, StepSpecification};
//!
//! // {{x, y}} -> {{x, y}, {y, z}}, with z a fresh atom.
//! let rule = Rule::new(vec![vec![-1, -2]], vec![vec![-1, -2], vec![-2, -3]]);
//! let mut set = Set::new(vec![rule], vec![vec![1, 2]])?;
//! let applied = set.replace(StepSpecification::default().with_max_events(1), || false)?;
//! assert_eq!(applied, 1);
//! assert_eq!(set.expressions().len(), 3);
//! # Ok::<(), setreplace_core::SetError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod atoms_index;
mod digest;
mod ident;
mod match_set;
mod matcher;
mod record;
mod rule;
mod set;
mod step;
mod telemetry;

// Re-exports for stable public API
/// Identifier types for atoms, hyperedges, expressions, and events.
pub use ident::{Atom, AtomsVector, EventId, ExpressionId, Hash};
/// History records returned by [`Set::expressions`] and [`Set::events`].
pub use record::{Event, Expression};
/// Substitution rules.
pub use rule::Rule;
/// The stepping controller and its error type.
pub use set::{Set, SetError};
/// Step specification and termination reasons for [`Set::replace`].
pub use step::{StepSpecification, TerminationReason};
