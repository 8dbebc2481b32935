// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

// Structured log events emitted by the stepping controller.
// Everything goes through `tracing`; the library never installs a subscriber.

use tracing::{debug, info, trace};

use crate::record::Event;
use crate::step::TerminationReason;

/// Emits a debug event after an event has been committed to the log.
pub(crate) fn event_applied(event: &Event) {
    debug!(
        event = event.id.index(),
        rule = event.rule,
        generation = event.generation,
        inputs = event.inputs.len(),
        outputs = event.outputs.len(),
        "event applied"
    );
}

/// Emits a trace event after pending expressions were searched for new matches.
pub(crate) fn matches_refreshed(searched: usize, indexed: usize) {
    trace!(searched, indexed, "match set refreshed");
}

/// Emits a debug event when a final-size limit refuses the next candidate.
pub(crate) fn candidate_refused(rule: usize, reason: TerminationReason) {
    debug!(rule, ?reason, "candidate event refused");
}

/// Emits a debug event when cancellation is observed.
pub(crate) fn aborted(site: &'static str, events_applied: usize) {
    debug!(site, events_applied, "evolution aborted");
}

/// Emits a summary event at the end of a `replace` run.
pub(crate) fn replace_summary(events_applied: usize, reason: TerminationReason) {
    info!(events_applied, ?reason, "replace finished");
}
