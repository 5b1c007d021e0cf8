//! Pipeline statistics tracking.
//!
//! The pipeline is single-threaded, so counters are plain integers owned by
//! the run rather than atomics shared across tasks.

use std::collections::HashMap;
use strum::IntoEnumIterator;

use super::types::PipelineEvent;

/// Counts of recoverable events for one run.
///
/// Every [`PipelineEvent`] is present with a zero count after `new()`.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    events: HashMap<PipelineEvent, usize>,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStats {
    /// All counters start at zero.
    pub fn new() -> Self {
        let events = PipelineEvent::iter().map(|event| (event, 0)).collect();
        PipelineStats { events }
    }

    /// Counts one occurrence.
    pub fn increment(&mut self, event: PipelineEvent) {
        self.add(event, 1);
    }

    /// Counts `count` occurrences at once.
    pub fn add(&mut self, event: PipelineEvent, count: usize) {
        *self.events.entry(event).or_insert(0) += count;
    }

    /// Current count for an event.
    pub fn get(&self, event: PipelineEvent) -> usize {
        self.events.get(&event).copied().unwrap_or(0)
    }

    /// Total number of events that dropped a relay or a line.
    pub fn total_losses(&self) -> usize {
        PipelineEvent::iter()
            .filter(PipelineEvent::is_loss)
            .map(|event| self.get(event))
            .sum()
    }

    /// Sum over all events, informational ones included.
    pub fn total(&self) -> usize {
        self.events.values().sum()
    }
}
