//! Structured event logging (SPEC_FULL.md §2.1 ambient stack).
//!
//! The engine never writes to stdout/stderr or a global logger directly;
//! callers supply a [`LogSink`] at construction (or take the no-op
//! default). Events are plain `serde`-serializable structs so a sink can
//! render them as JSONL, forward them to a real logging facade, or
//! collect them for a test assertion.

use crate::id::Id128;
use serde::{Deserialize, Serialize};

/// One ingest transaction's outcome (spec.md §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestEvent {
    pub source_identifier: String,
    pub atoms_processed: usize,
    pub compositions_created: usize,
    pub relations_created: usize,
    pub original_bytes: usize,
    pub stored_bytes: usize,
    pub compression_ratio: f64,
}

/// One dual-ELO observation (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    pub relation_id: Id128,
    pub outcome: f64,
    pub base_elo_after: f64,
    pub consensus_elo_after: f64,
    pub observations_after: u64,
}

/// One walk step (spec.md §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkStepEvent {
    pub step: usize,
    pub composition_id: Id128,
    pub energy_remaining: f64,
}

/// An engine event, for sinks that want a single type to dispatch on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    Ingest(IngestEvent),
    Rating(RatingEvent),
    WalkStep(WalkStepEvent),
}

/// Receives engine events. The default `()` sink discards everything;
/// `substrate-harness` provides a JSONL-file sink built on the same
/// trait for its CLI and fixture runs.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Discards every event. The engine's default when no sink is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Collects every event in-process, for assertions in tests.
#[derive(Default)]
pub struct RecordingSink {
    events: parking_lot::Mutex<Vec<Event>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Tier;

    #[test]
    fn recording_sink_accumulates_in_order() {
        let sink = RecordingSink::new();
        sink.emit(Event::WalkStep(WalkStepEvent {
            step: 0,
            composition_id: Id128::for_tier(Tier::Composition, [1; 16]),
            energy_remaining: 1.0,
        }));
        sink.emit(Event::WalkStep(WalkStepEvent {
            step: 1,
            composition_id: Id128::for_tier(Tier::Composition, [2; 16]),
            energy_remaining: 0.9,
        }));
        assert_eq!(sink.snapshot().len(), 2);
    }
}
